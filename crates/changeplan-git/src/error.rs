use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git operation failed")]
    Git(#[from] git2::Error),

    #[error("no git repository contains '{path}'")]
    NotARepository { path: PathBuf },

    #[error("revision '{refspec}' does not name a commit")]
    RefNotFound { refspec: String },

    #[error("failed to walk commits in '{range}'")]
    Walk {
        range: String,
        #[source]
        source: git2::Error,
    },
}
