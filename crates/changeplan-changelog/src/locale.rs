use std::fmt;

use changeplan_core::CommitType;
use serde::{Deserialize, Serialize};

/// Language used for section titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
    Fr,
    Es,
}

impl Locale {
    /// Parses a language tag such as `de` or `fr-CA`, falling back to English.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "de" => Self::De,
            "fr" => Self::Fr,
            "es" => Self::Es,
            "en" => Self::En,
            _ => {
                tracing::debug!(tag, "unknown locale, using en");
                Self::En
            }
        }
    }

    #[must_use]
    pub fn section_title(self, commit_type: CommitType) -> &'static str {
        use CommitType::{Build, Chore, Ci, Docs, Feat, Fix, Perf, Refactor, Revert, Style, Test};

        match (self, commit_type) {
            (Self::En, Feat) => "Features",
            (Self::En, Fix) => "Bug Fixes",
            (Self::En, Perf) => "Performance Improvements",
            (Self::En, Refactor) => "Code Refactoring",
            (Self::En, Docs) => "Documentation",
            (Self::En, Build) => "Build System",
            (Self::En, Ci) => "Continuous Integration",
            (Self::En, Test) => "Tests",
            (Self::En, Chore) => "Chores",
            (Self::En, Revert) => "Reverts",
            (Self::En, Style) => "Styles",

            (Self::De, Feat) => "Neue Funktionen",
            (Self::De, Fix) => "Fehlerbehebungen",
            (Self::De, Perf) => "Leistungsverbesserungen",
            (Self::De, Refactor) => "Refactoring",
            (Self::De, Docs) => "Dokumentation",
            (Self::De, Build) => "Build-System",
            (Self::De, Ci) => "Kontinuierliche Integration",
            (Self::De, Test) => "Tests",
            (Self::De, Chore) => "Wartung",
            (Self::De, Revert) => "Rücknahmen",
            (Self::De, Style) => "Stil",

            (Self::Fr, Feat) => "Fonctionnalités",
            (Self::Fr, Fix) => "Corrections de bugs",
            (Self::Fr, Perf) => "Améliorations des performances",
            (Self::Fr, Refactor) => "Refactorisation",
            (Self::Fr, Docs) => "Documentation",
            (Self::Fr, Build) => "Système de build",
            (Self::Fr, Ci) => "Intégration continue",
            (Self::Fr, Test) => "Tests",
            (Self::Fr, Chore) => "Maintenance",
            (Self::Fr, Revert) => "Annulations",
            (Self::Fr, Style) => "Style",

            (Self::Es, Feat) => "Nuevas funcionalidades",
            (Self::Es, Fix) => "Corrección de errores",
            (Self::Es, Perf) => "Mejoras de rendimiento",
            (Self::Es, Refactor) => "Refactorización",
            (Self::Es, Docs) => "Documentación",
            (Self::Es, Build) => "Sistema de compilación",
            (Self::Es, Ci) => "Integración continua",
            (Self::Es, Test) => "Pruebas",
            (Self::Es, Chore) => "Mantenimiento",
            (Self::Es, Revert) => "Reversiones",
            (Self::Es, Style) => "Estilo",
        }
    }

    #[must_use]
    pub fn breaking_title(self) -> &'static str {
        match self {
            Self::En => "Breaking Changes",
            Self::De => "Inkompatible Änderungen",
            Self::Fr => "Changements incompatibles",
            Self::Es => "Cambios incompatibles",
        }
    }

    #[must_use]
    pub fn highlights_title(self) -> &'static str {
        match self {
            Self::En => "Highlights",
            Self::De => "Höhepunkte",
            Self::Fr => "Points forts",
            Self::Es => "Destacados",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::En => "en",
            Self::De => "de",
            Self::Fr => "fr",
            Self::Es => "es",
        })
    }
}
