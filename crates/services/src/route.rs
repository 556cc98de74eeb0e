/// Screen transitions the session core asks the routing collaborator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// No usable session: start over with the setup step.
    Setup,
    /// A session exists but is not finished.
    Quiz,
    /// The session has been submitted.
    Results,
}
