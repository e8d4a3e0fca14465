use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error returned when a textual choice is not one of the allowed values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {parameter} '{value}', allowed values are: {allowed}")]
pub struct ParseChoiceError {
    pub parameter: &'static str,
    pub value: String,
    pub allowed: String,
}

impl ParseChoiceError {
    pub fn new(parameter: &'static str, value: &str, allowed: &[&str]) -> Self {
        Self {
            parameter,
            value: value.to_string(),
            allowed: allowed.join(", "),
        }
    }
}

/// Hand a client's images were captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Hand {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hand::Left => "L",
            Hand::Right => "R",
        }
    }
}

impl FromStr for Hand {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L" => Ok(Hand::Left),
            "R" => Ok(Hand::Right),
            other => Err(ParseChoiceError::new("hand", other, &["L", "R"])),
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Dev,
    Eval,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::Dev, Group::Eval];

    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Dev => "dev",
            Group::Eval => "eval",
        }
    }
}

impl FromStr for Group {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Group::Dev),
            "eval" => Ok(Group::Eval),
            other => Err(ParseChoiceError::new("group", other, &["dev", "eval"])),
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol purpose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Enroll,
    Probe,
}

impl Purpose {
    pub const ALL: [Purpose; 2] = [Purpose::Enroll, Purpose::Probe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Enroll => "enroll",
            Purpose::Probe => "probe",
        }
    }
}

impl FromStr for Purpose {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enroll" => Ok(Purpose::Enroll),
            "probe" => Ok(Purpose::Probe),
            other => Err(ParseChoiceError::new("purpose", other, &["enroll", "probe"])),
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single hand of a person. Both hands of the same person are separate clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub original_client_id: i64,
    pub hand: Hand,
}

/// An image stored in the database
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct File {
    pub id: i64,
    pub client_id: i64,
    /// Relative to the image directory, `/`-separated, without extension
    pub path: String,
    pub model_id: String,
}

impl File {
    /// Full path of this file below `directory`, with `extension` appended
    pub fn make_path(&self, directory: &Path, extension: &str) -> PathBuf {
        let mut full = directory.to_path_buf();
        for component in self.path.split('/') {
            full.push(component);
        }
        if !extension.is_empty() {
            let mut name = full.into_os_string();
            name.push(extension);
            full = PathBuf::from(name);
        }
        full
    }
}

/// Build the model id of the `nr`-th (1-based) image of a client
pub fn model_id(client_id: i64, nr: usize) -> String {
    format!("c_{}_i_{}", client_id, nr)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolPurpose {
    pub id: i64,
    pub protocol_id: i64,
    pub protocol_name: String,
    pub group: Group,
    pub purpose: Purpose,
}

/// Input structure for creating a new client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub original_client_id: i64,
    pub hand: Hand,
}

/// Input structure for creating a new file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    pub client_id: i64,
    pub path: String,
    pub model_id: String,
}

/// Criteria for retrieving clients. Empty vectors apply no filter.
#[derive(Debug, Clone, Default)]
pub struct ClientCriteria {
    pub hands: Vec<Hand>,
    /// Non-empty protocols or groups keep only clients with files linked to them
    pub protocols: Vec<String>,
    pub groups: Vec<Group>,
}

/// Criteria for retrieving files linked to protocol purposes
#[derive(Debug, Clone)]
pub struct FileCriteria {
    pub protocols: Vec<String>,
    pub group: Group,
    pub purposes: Vec<Purpose>,
    pub model_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choices() {
        assert_eq!("L".parse::<Hand>().unwrap(), Hand::Left);
        assert_eq!("eval".parse::<Group>().unwrap(), Group::Eval);
        assert_eq!("probe".parse::<Purpose>().unwrap(), Purpose::Probe);

        let err = "world".parse::<Group>().unwrap_err();
        assert_eq!(err.parameter, "group");
        assert!(err.to_string().contains("dev, eval"));
        assert!("left".parse::<Hand>().is_err());
    }

    #[test]
    fn test_make_path() {
        let file = File {
            id: 1,
            client_id: 1,
            path: "Person_01/Left/BioPic_20160425_114336".to_string(),
            model_id: model_id(1, 1),
        };
        let full = file.make_path(Path::new("/data/biowave"), ".png");
        assert_eq!(
            full,
            Path::new("/data/biowave/Person_01/Left/BioPic_20160425_114336.png")
        );
        assert_eq!(file.make_path(Path::new(""), ""), Path::new("Person_01/Left/BioPic_20160425_114336"));
    }

    #[test]
    fn test_model_id_format() {
        assert_eq!(model_id(40, 2), "c_40_i_2");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Hand::Right).unwrap_or_default(), "\"R\"");
    }
}
