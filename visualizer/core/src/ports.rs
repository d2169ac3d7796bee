use std::fmt;

/// The ports a rule applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ports {
    /// The rule does not restrict ports.
    All,

    /// The rule applies only to the listed ports.
    Specific(Vec<PortRef>),
}

/// A single port entry of a rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub protocol: String,

    /// Unset when the entry only restricts the protocol.
    pub port: Option<PortValue>,

    /// The inclusive upper bound of a port range.
    pub end_port: Option<u16>,
}

/// References a port by number or by a container port's name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortValue {
    Number(u16),
    Name(String),
}

// === impl Ports ===

impl Ports {
    pub const ALL_LABEL: &'static str = "all ports";

    /// Builds a port list from a rule's entries. No entries means all ports.
    pub fn from_refs(refs: impl IntoIterator<Item = PortRef>) -> Self {
        let refs = refs.into_iter().collect::<Vec<_>>();
        if refs.is_empty() {
            Self::All
        } else {
            Self::Specific(refs)
        }
    }

    /// Combines two port lists. `All` absorbs anything it is combined with.
    pub fn union(self, other: Self) -> Self {
        match (self, other) {
            (Self::Specific(mut a), Self::Specific(b)) => {
                a.extend(b);
                a.sort();
                a.dedup();
                Self::Specific(a)
            }
            _ => Self::All,
        }
    }

    /// Each entry rendered on its own, as `protocol:port`.
    pub fn entries(&self) -> Vec<String> {
        match self {
            Self::All => vec![Self::ALL_LABEL.to_string()],
            Self::Specific(refs) => refs.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Renders the rule's port spec: `all ports`, or `TCP:80, UDP:53`.
impl fmt::Display for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => Self::ALL_LABEL.fmt(f),
            Self::Specific(refs) => {
                let mut refs = refs.iter();
                if let Some(first) = refs.next() {
                    first.fmt(f)?;
                    for r in refs {
                        write!(f, ", {r}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

// === impl PortRef ===

impl PortRef {
    pub const DEFAULT_PROTOCOL: &'static str = "TCP";

    pub fn tcp(port: u16) -> Self {
        Self {
            protocol: Self::DEFAULT_PROTOCOL.to_string(),
            port: Some(PortValue::Number(port)),
            end_port: None,
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.protocol)?;
        match &self.port {
            Some(port) => port.fmt(f)?,
            None => f.write_str("*")?,
        }
        if let Some(end) = self.end_port {
            write!(f, "-{end}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::Name(n) => fmt::Display::fmt(n, f),
        }
    }
}
