//! Ошибки: misuse коллабораторов и загрузка config

use thiserror::Error;

use crate::entity_id::EntityId;

/// Неправильное использование health registry
///
/// В нормальном потоке контроллеры их не вызывают: id на spawn всегда свежий,
/// destroy защищён собственным флагом.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Повторная живая регистрация того же id
    #[error("entity {0} already has a live health registration")]
    AlreadyRegistered(EntityId),

    /// Unregister id, которого registry не знает (или уже снял)
    #[error("entity {0} has no health registration")]
    NotRegistered(EntityId),
}

/// Config не загрузился или не прошёл проверку
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Значение распарсилось, но симуляция с ним сломается
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}
