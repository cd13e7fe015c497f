use serde::{Deserialize, Serialize};

/// Resolution of vertex identities.
///
/// Extractors report calls between qualified method identities such as
/// `"OrderService.Place"`. At class granularity every method of a class
/// collapses into one vertex named after the class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One vertex per method identity (identities are used as given).
    #[default]
    Method,
    /// One vertex per class: the identity up to its last `.`.
    Class,
}

impl Granularity {
    /// Map an extractor identity to the vertex identity at this granularity.
    pub fn resolve<'a>(&self, identity: &'a str) -> &'a str {
        match self {
            Granularity::Method => identity,
            Granularity::Class => class_of(identity),
        }
    }
}

/// Owning class of a qualified method identity, or the identity itself when
/// it carries no qualifier.
pub fn class_of(identity: &str) -> &str {
    identity
        .rsplit_once('.')
        .map(|(class, _)| class)
        .filter(|class| !class.is_empty())
        .unwrap_or(identity)
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "method" => Ok(Granularity::Method),
            "class" => Ok(Granularity::Class),
            other => Err(format!("unknown granularity '{other}', expected 'method' or 'class'")),
        }
    }
}
