use ipnet::IpNet;
use std::fmt;

/// A peer described by an IP range rather than by labels.
///
/// Blocks are surfaced for display only; they never participate in
/// workload-to-workload decisions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IpBlock {
    /// A network to match against.
    pub net: IpNet,

    /// Networks to exclude from the match.
    pub except: Vec<IpNet>,
}

// === impl IpBlock ===

impl IpBlock {
    pub fn new(net: IpNet, except: impl IntoIterator<Item = IpNet>) -> Self {
        Self {
            net,
            except: except.into_iter().collect(),
        }
    }

    /// A human-readable node label, e.g. `IPBlock: 10.0.0.0/8`.
    pub fn label(&self) -> String {
        format!("IPBlock: {}", self.net)
    }
}

impl From<IpNet> for IpBlock {
    fn from(net: IpNet) -> Self {
        Self {
            net,
            except: vec![],
        }
    }
}

/// Renders the synthetic id, e.g. `ipBlock:10.0.0.0/8 except 10.1.0.0/16`.
impl fmt::Display for IpBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ipBlock:{}", self.net)?;
        let mut except = self.except.iter();
        if let Some(first) = except.next() {
            write!(f, " except {first}")?;
            for net in except {
                write!(f, ",{net}")?;
            }
        }
        Ok(())
    }
}
