/// Clients for other services
///
/// - `membership`: asks a remote board service for a caller's role

pub mod membership;

pub use membership::HttpMembershipChecker;
