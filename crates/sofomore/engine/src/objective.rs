use std::fmt;

type ScalarObjective = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Multiobjective function assembled from single-objective ones.
#[derive(Default)]
pub struct ObjectiveFunctions {
    functions: Vec<ScalarObjective>,
}

impl ObjectiveFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        self.functions.push(Box::new(f));
        self
    }

    /// Number of objectives.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn evaluate(&self, x: &[f64]) -> Vec<f64> {
        self.functions.iter().map(|f| f(x)).collect()
    }
}

impl fmt::Debug for ObjectiveFunctions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectiveFunctions")
            .field("objectives", &self.functions.len())
            .finish()
    }
}
