use crate::diagnostics::Diagnostic;
use crate::pool::KernelId;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Caller-supplied sort key over kernel indices; lower keys are asked first.
#[derive(Clone)]
pub struct OrderKey(Arc<dyn Fn(KernelId) -> f64 + Send + Sync>);

impl OrderKey {
    pub fn new(key: impl Fn(KernelId) -> f64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(key))
    }

    pub fn key(&self, id: KernelId) -> f64 {
        (self.0)(id)
    }
}

impl std::fmt::Debug for OrderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderKey(..)")
    }
}

/// Order in which kernels are picked to sample offspring.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOrder {
    /// Fresh uniform key per index at every sort.
    #[default]
    Random,
    IndexAscending,
    IndexDescending,
    EvenFirst,
    OddFirst,
    #[serde(skip)]
    Custom(OrderKey),
}

impl UpdateOrder {
    /// Sort key of `id`; ties keep the incoming order.
    pub fn key(&self, id: KernelId, rng: &mut StdRng) -> f64 {
        let i = id.0 as f64;
        match self {
            Self::Random => rng.gen::<f64>(),
            Self::IndexAscending => i,
            Self::IndexDescending => -i,
            Self::EvenFirst => (id.0 % 2) as f64,
            Self::OddFirst => -((id.0 % 2) as f64),
            Self::Custom(key) => key.key(id),
        }
    }
}

/// Settings of a [`Sofomore`](crate::Sofomore) run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SofomoreOptions {
    /// Track every evaluated objective vector in a non-dominated archive.
    /// Never influences the optimization.
    pub archive: bool,
    pub update_order: UpdateOrder,
    /// Stop reasons after which a terminated kernel is not restarted.
    pub restart_skip_reasons: Vec<String>,
    /// Seed of the coordinator's RNG; `None` draws from entropy.
    pub seed: Option<u64>,
    /// `disp` logs every this many rounds; 0 disables it.
    pub display_modulo: u64,
}

impl Default for SofomoreOptions {
    fn default() -> Self {
        Self {
            archive: true,
            update_order: UpdateOrder::Random,
            restart_skip_reasons: vec!["timeout".into()],
            seed: None,
            display_modulo: 100,
        }
    }
}

impl SofomoreOptions {
    /// Reproducible settings for demos and experiments.
    pub fn demo() -> Self {
        Self {
            update_order: UpdateOrder::IndexAscending,
            seed: Some(1),
            display_modulo: 20,
            ..Self::default()
        }
    }

    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    pub fn with_update_order(mut self, order: UpdateOrder) -> Self {
        self.update_order = order;
        self
    }

    pub fn with_restart_skip_reasons(mut self, reasons: Vec<String>) -> Self {
        self.restart_skip_reasons = reasons;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_display_modulo(mut self, modulo: u64) -> Self {
        self.display_modulo = modulo;
        self
    }

    /// Read options from a JSON value, keeping defaults for anything
    /// missing or malformed.
    ///
    /// `null` means "all defaults". A non-object value, an unknown key or a
    /// value of the wrong shape each produce a
    /// [`Diagnostic::ConfigurationWarning`].
    pub fn from_json(value: &serde_json::Value) -> (Self, Vec<Diagnostic>) {
        let mut options = Self::default();
        let mut diagnostics = Vec::new();

        let Some(map) = value.as_object() else {
            if !value.is_null() {
                diagnostics.push(configuration_warning(
                    "options should be either an object or null, using defaults".into(),
                ));
            }
            return (options, diagnostics);
        };

        for (key, v) in map {
            let applied = match key.as_str() {
                "archive" => v.as_bool().map(|b| options.archive = b).is_some(),
                "update_order" => serde_json::from_value::<UpdateOrder>(v.clone())
                    .map(|o| options.update_order = o)
                    .is_ok(),
                "restart_skip_reasons" => serde_json::from_value::<Vec<String>>(v.clone())
                    .map(|r| options.restart_skip_reasons = r)
                    .is_ok(),
                "seed" => serde_json::from_value::<Option<u64>>(v.clone())
                    .map(|s| options.seed = s)
                    .is_ok(),
                "display_modulo" => v.as_u64().map(|m| options.display_modulo = m).is_some(),
                other => {
                    diagnostics.push(configuration_warning(format!(
                        "unknown option '{}' ignored",
                        other
                    )));
                    continue;
                }
            };
            if !applied {
                diagnostics.push(configuration_warning(format!(
                    "malformed value {} for option '{}', keeping the default",
                    v, key
                )));
            }
        }

        (options, diagnostics)
    }
}

fn configuration_warning(message: String) -> Diagnostic {
    warn!(%message, "configuration warning");
    Diagnostic::ConfigurationWarning { message }
}
