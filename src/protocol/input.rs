/// One line of the ref list git writes to a pre-push hook's stdin:
/// `<local ref> <local sha> <remote ref> <remote sha>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    pub local_ref: String,
    pub local_sha: String,
    pub remote_ref: String,
    pub remote_sha: String,
}

impl RefUpdate {
    /// A push that deletes `remote_ref` sends an all-zero local sha.
    pub fn is_deletion(&self) -> bool {
        is_null_sha(&self.local_sha)
    }
}

/// Everything git hands a pre-push hook: the two positional arguments
/// plus the parsed stdin ref list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushInput {
    pub remote_name: Option<String>,
    pub remote_url: Option<String>,
    pub updates: Vec<RefUpdate>,
}

impl PushInput {
    /// True when there is at least one update and every update is a deletion.
    ///
    /// An empty ref list (hook run by hand, or git sent nothing) is not
    /// deletion-only: the working tree still gets tested.
    pub fn is_deletion_only(&self) -> bool {
        !self.updates.is_empty() && self.updates.iter().all(RefUpdate::is_deletion)
    }
}

/// Error from a malformed pre-push stdin line.
#[derive(Debug, thiserror::Error)]
#[error("line {line}: expected '<local ref> <local sha> <remote ref> <remote sha>', got '{text}'")]
pub struct RefLineError {
    pub line: usize,
    pub text: String,
}

/// Parse the pre-push stdin ref list. Blank lines are skipped.
pub fn parse_ref_updates(input: &str) -> Result<Vec<RefUpdate>, RefLineError> {
    let mut updates = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        let fields: Vec<&str> = text.split_whitespace().collect();
        let [local_ref, local_sha, remote_ref, remote_sha] = fields.as_slice() else {
            return Err(RefLineError {
                line: idx + 1,
                text: text.to_string(),
            });
        };
        updates.push(RefUpdate {
            local_ref: local_ref.to_string(),
            local_sha: local_sha.to_string(),
            remote_ref: remote_ref.to_string(),
            remote_sha: remote_sha.to_string(),
        });
    }
    Ok(updates)
}

// SHA-1 and SHA-256 repositories both use all-zero object names for "none".
fn is_null_sha(sha: &str) -> bool {
    !sha.is_empty() && sha.bytes().all(|b| b == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO: &str = "0000000000000000000000000000000000000000";
    const SHA_A: &str = "1111111111111111111111111111111111111111";
    const SHA_B: &str = "2222222222222222222222222222222222222222";

    #[test]
    fn parse_single_update() {
        let input = format!("refs/heads/main {SHA_A} refs/heads/main {SHA_B}\n");
        let updates = parse_ref_updates(&input).unwrap();
        assert_eq!(
            updates,
            vec![RefUpdate {
                local_ref: "refs/heads/main".into(),
                local_sha: SHA_A.into(),
                remote_ref: "refs/heads/main".into(),
                remote_sha: SHA_B.into(),
            }]
        );
    }

    #[test]
    fn parse_skips_blank_lines() {
        let input = format!("\nrefs/heads/a {SHA_A} refs/heads/a {ZERO}\n\n");
        assert_eq!(parse_ref_updates(&input).unwrap().len(), 1);
    }

    #[test]
    fn parse_empty_input_is_empty() {
        assert!(parse_ref_updates("").unwrap().is_empty());
    }

    #[test]
    fn parse_short_line_reports_line_number() {
        let input = format!("refs/heads/a {SHA_A} refs/heads/a {ZERO}\nrefs/heads/b {SHA_A}\n");
        let err = parse_ref_updates(&input).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn new_branch_is_not_deletion() {
        let update = RefUpdate {
            local_ref: "refs/heads/feature".into(),
            local_sha: SHA_A.into(),
            remote_ref: "refs/heads/feature".into(),
            remote_sha: ZERO.into(),
        };
        assert!(!update.is_deletion());
    }

    #[test]
    fn deletion_only_push() {
        let push = PushInput {
            updates: vec![RefUpdate {
                local_ref: "(delete)".into(),
                local_sha: ZERO.into(),
                remote_ref: "refs/heads/old".into(),
                remote_sha: SHA_B.into(),
            }],
            ..Default::default()
        };
        assert!(push.is_deletion_only());
    }

    #[test]
    fn empty_push_is_not_deletion_only() {
        assert!(!PushInput::default().is_deletion_only());
    }

    #[test]
    fn mixed_push_is_not_deletion_only() {
        let input = format!(
            "(delete) {ZERO} refs/heads/old {SHA_B}\nrefs/heads/main {SHA_A} refs/heads/main {SHA_B}\n"
        );
        let push = PushInput {
            updates: parse_ref_updates(&input).unwrap(),
            ..Default::default()
        };
        assert!(!push.is_deletion_only());
    }
}
