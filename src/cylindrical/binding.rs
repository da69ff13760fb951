/// Names of the three cylindrical coordinates as they appear in expression text.
///
/// The binding is a constant value passed explicitly to the parser, the evaluators and the
/// integrator; nothing reads it from global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableBinding {
    /// radius
    pub radial: &'static str,
    /// angle in radians
    pub angular: &'static str,
    /// height
    pub vertical: &'static str,
}

impl VariableBinding {
    pub const CYLINDRICAL: VariableBinding = VariableBinding {
        radial: "r",
        angular: "theta",
        vertical: "z",
    };

    /// names in evaluation order (radial, angular, vertical)
    pub fn names(&self) -> [&'static str; 3] {
        [self.radial, self.angular, self.vertical]
    }
}

impl Default for VariableBinding {
    fn default() -> Self {
        VariableBinding::CYLINDRICAL
    }
}
