//! Who is submitting: the `user@host` string sent with every enqueue.

/// Source of the local user name. The node name part is shared by all
/// providers.
pub trait IdentityProvider {
    fn username(&self) -> Option<String>;

    /// `<user>@<node>`, with `unknown` standing in for either part.
    fn whoami(&self) -> String {
        let user = self
            .username()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());
        format!("{}@{}", user, node_name())
    }
}

const UNKNOWN: &str = "unknown";

/// Passwd lookup of the current uid.
#[cfg(unix)]
pub struct SystemDirectoryIdentity;

#[cfg(unix)]
impl IdentityProvider for SystemDirectoryIdentity {
    fn username(&self) -> Option<String> {
        users::get_user_by_uid(users::get_current_uid())
            .map(|user| user.name().to_string_lossy().into_owned())
    }
}

/// User name taken from the login environment variables.
pub struct EnvironmentIdentity;

const USER_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

impl IdentityProvider for EnvironmentIdentity {
    fn username(&self) -> Option<String> {
        first_name(|var| std::env::var(var).ok())
    }
}

fn first_name(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    USER_VARS
        .iter()
        .filter_map(|&var| lookup(var))
        .find(|name| !name.is_empty())
}

/// Pick the provider once at startup: the user database where the
/// platform has one, the environment otherwise.
#[cfg(unix)]
pub fn detect() -> Box<dyn IdentityProvider> {
    Box::new(SystemDirectoryIdentity)
}

#[cfg(not(unix))]
pub fn detect() -> Box<dyn IdentityProvider> {
    Box::new(EnvironmentIdentity)
}

/// Network node name of this machine.
pub fn node_name() -> String {
    #[cfg(unix)]
    let node = nix::unistd::gethostname()
        .ok()
        .map(|name| name.to_string_lossy().into_owned());
    #[cfg(not(unix))]
    let node = std::env::var("COMPUTERNAME").ok();

    node.filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
