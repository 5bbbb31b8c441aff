// Engine configuration. Capacity used to be a hard-coded constant in the
// eligibility check; it is an explicit value here so deployments can tune it.

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of active (ENROLLED + PENDING) enrollments per course
    pub course_capacity: u32,

    /// When true, COMPLETED and FAILED enrollments cannot be deleted.
    /// The historical behavior was an unconditional delete; protection is
    /// the default and callers that need the old behavior opt out.
    pub protect_terminal_enrollments: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            course_capacity: 50,
            protect_terminal_enrollments: true,
        }
    }
}

impl EngineConfig {
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.course_capacity = capacity;
        self
    }

    pub fn with_terminal_protection(mut self, protect: bool) -> Self {
        self.protect_terminal_enrollments = protect;
        self
    }
}
