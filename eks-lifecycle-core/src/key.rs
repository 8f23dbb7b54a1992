//! Compound resource identifiers
//!
//! EKS child resources are addressed by their parent cluster plus one or two
//! child names. The parts are joined into the single opaque ID persisted in
//! Terraform state and split back apart on every read, update and delete.
//!
//! The separator is never escaped. Callers must make sure no part contains it,
//! except for the trailing part of a format built with
//! [`KeyFormat::with_open_trailing_part`].

use std::fmt;

use thiserror::Error;

/// Separator used by every two-part EKS identifier.
pub const DEFAULT_SEPARATOR: char = ':';

/// Errors produced while encoding or decoding a compound key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// The ID does not split into the expected number of non-empty parts.
    #[error("unexpected format for ID ({id}), expected {expected}")]
    Malformed { id: String, expected: String },

    /// Wrong number of parts passed to [`KeyFormat::encode`].
    #[error("expected {expected} ID parts, got {actual}")]
    Arity { expected: usize, actual: usize },

    /// A part passed to [`KeyFormat::encode`] is empty.
    #[error("ID part {label} must not be empty")]
    EmptyPart { label: &'static str },

    /// A part passed to [`KeyFormat::encode`] contains the separator.
    #[error("ID part {label} ({value}) must not contain '{separator}'")]
    SeparatorInPart {
        label: &'static str,
        value: String,
        separator: char,
    },
}

pub type KeyResult<T> = Result<T, KeyError>;

/// Shape of a compound key: one label per part and the separator between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyFormat {
    labels: &'static [&'static str],
    separator: char,
    open_trailing_part: bool,
}

impl KeyFormat {
    pub const fn new(labels: &'static [&'static str]) -> Self {
        Self {
            labels,
            separator: DEFAULT_SEPARATOR,
            open_trailing_part: false,
        }
    }

    pub const fn with_separator(self, separator: char) -> Self {
        Self { separator, ..self }
    }

    /// Allow the last part to contain the separator (e.g. an IAM principal ARN
    /// after a cluster name). Decoding splits at most `arity - 1` times.
    pub const fn with_open_trailing_part(self) -> Self {
        Self {
            open_trailing_part: true,
            ..self
        }
    }

    pub fn arity(&self) -> usize {
        self.labels.len()
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// Join `parts` into a single ID.
    pub fn encode(&self, parts: &[&str]) -> KeyResult<String> {
        if parts.len() != self.arity() {
            return Err(KeyError::Arity {
                expected: self.arity(),
                actual: parts.len(),
            });
        }

        let last = parts.len() - 1;
        for (index, (part, label)) in parts.iter().zip(self.labels.iter().copied()).enumerate() {
            if part.is_empty() {
                return Err(KeyError::EmptyPart { label });
            }
            let may_contain_separator = self.open_trailing_part && index == last;
            if !may_contain_separator && part.contains(self.separator) {
                return Err(KeyError::SeparatorInPart {
                    label,
                    value: (*part).to_string(),
                    separator: self.separator,
                });
            }
        }

        Ok(parts.join(&self.separator.to_string()))
    }

    /// Split `id` into exactly [`arity`](Self::arity) non-empty parts.
    pub fn decode(&self, id: &str) -> KeyResult<Vec<String>> {
        let parts: Vec<&str> = if self.open_trailing_part {
            id.splitn(self.arity(), self.separator).collect()
        } else {
            id.split(self.separator).collect()
        };

        if parts.len() != self.arity() || parts.iter().any(|part| part.is_empty()) {
            return Err(KeyError::Malformed {
                id: id.to_string(),
                expected: self.to_string(),
            });
        }

        Ok(parts.into_iter().map(str::to_string).collect())
    }

    /// Like [`decode`](Self::decode), into a fixed-size array.
    pub fn decode_array<const N: usize>(&self, id: &str) -> KeyResult<[String; N]> {
        self.decode(id)?
            .try_into()
            .map_err(|_: Vec<String>| KeyError::Malformed {
                id: id.to_string(),
                expected: self.to_string(),
            })
    }
}

impl fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, label) in self.labels.iter().enumerate() {
            if index > 0 {
                write!(f, "{}", self.separator)?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const ADDON: KeyFormat = KeyFormat::new(&["CLUSTER_NAME", "ADDON_NAME"]);
    const POLICY_ASSOCIATION: KeyFormat =
        KeyFormat::new(&["CLUSTER_NAME", "PRINCIPAL_ARN", "POLICY_ARN"]).with_separator('#');
    const ACCESS_ENTRY: KeyFormat =
        KeyFormat::new(&["CLUSTER_NAME", "PRINCIPAL_ARN"]).with_open_trailing_part();

    #[test]
    fn test_encode_joins_with_separator() {
        assert_eq!(ADDON.encode(&["prod", "vpc-cni"]).unwrap(), "prod:vpc-cni");
    }

    #[test]
    fn test_decode_two_parts() {
        let [cluster, addon]: [String; 2] = ADDON.decode_array("prod:vpc-cni").unwrap();
        assert_eq!(cluster, "prod");
        assert_eq!(addon, "vpc-cni");
    }

    #[rstest]
    #[case("")]
    #[case("a")]
    #[case("a::b")]
    #[case(":b")]
    #[case("a:")]
    #[case("a:b:c")]
    fn test_decode_rejects_malformed(#[case] id: &str) {
        let err = ADDON.decode(id).unwrap_err();
        assert!(matches!(err, KeyError::Malformed { .. }));
        assert!(err.to_string().contains("CLUSTER_NAME:ADDON_NAME"), "{err}");
    }

    #[test]
    fn test_encode_rejects_empty_part() {
        assert_eq!(
            ADDON.encode(&["prod", ""]),
            Err(KeyError::EmptyPart {
                label: "ADDON_NAME"
            })
        );
    }

    #[test]
    fn test_encode_rejects_wrong_arity() {
        assert_eq!(
            ADDON.encode(&["prod"]),
            Err(KeyError::Arity {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_encode_rejects_separator_in_part() {
        let err = ADDON.encode(&["prod", "a:b"]).unwrap_err();
        assert!(matches!(err, KeyError::SeparatorInPart { separator: ':', .. }));
    }

    #[test]
    fn test_three_part_key_with_arns() {
        let id = POLICY_ASSOCIATION
            .encode(&[
                "prod",
                "arn:aws:iam::123456789012:role/admin",
                "arn:aws:eks::aws:cluster-access-policy/AmazonEKSViewPolicy",
            ])
            .unwrap();
        let [cluster, principal, policy]: [String; 3] = POLICY_ASSOCIATION.decode_array(&id).unwrap();
        assert_eq!(cluster, "prod");
        assert_eq!(principal, "arn:aws:iam::123456789012:role/admin");
        assert_eq!(
            policy,
            "arn:aws:eks::aws:cluster-access-policy/AmazonEKSViewPolicy"
        );
    }

    #[test]
    fn test_open_trailing_part_keeps_arn_intact() {
        let [cluster, principal]: [String; 2] = ACCESS_ENTRY
            .decode_array("prod:arn:aws:iam::123456789012:role/admin")
            .unwrap();
        assert_eq!(cluster, "prod");
        assert_eq!(principal, "arn:aws:iam::123456789012:role/admin");
        assert!(ACCESS_ENTRY.decode("prod:").is_err());
    }

    #[test]
    fn test_decode_array_with_wrong_length() {
        let result: KeyResult<[String; 3]> = ADDON.decode_array("prod:vpc-cni");
        assert!(result.is_err());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(
            POLICY_ASSOCIATION.to_string(),
            "CLUSTER_NAME#PRINCIPAL_ARN#POLICY_ARN"
        );
    }

    proptest! {
        #[test]
        fn prop_round_trip(a in "[A-Za-z0-9_.-]{1,40}", b in "[A-Za-z0-9_.-]{1,40}") {
            let id = ADDON.encode(&[a.as_str(), b.as_str()]).unwrap();
            prop_assert_eq!(ADDON.decode(&id).unwrap(), vec![a, b]);
        }
    }
}
