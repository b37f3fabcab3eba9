//! Asking the user for the name of the new table.

use crate::error::MergeError;

/// What the user did with the name dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptReply {
    /// Save pressed with this raw input
    Submitted(String),
    Cancelled,
}

/// A name-entry dialog: a title, one text input pre-filled with a
/// suggestion, and Save/Cancel.
pub trait NamePrompt {
    /// Show the dialog. `error` is set when the previous submission was
    /// rejected and should be shown inline.
    fn ask(&mut self, title: &str, suggested: &str, error: Option<&str>) -> PromptReply;
}

/// Trim a submitted name, rejecting one that is empty after trimming.
pub fn validate_table_name(raw: &str) -> Result<String, MergeError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(MergeError::Validation("Please enter a table name".into()));
    }
    Ok(name.to_string())
}

/// Keep asking until the user submits a usable name or cancels.
///
/// Empty submissions keep the dialog open with the validation message; they
/// are never returned to the caller.
pub fn request_table_name<P>(prompt: &mut P, title: &str, suggested: &str) -> Option<String>
where
    P: NamePrompt + ?Sized,
{
    let mut error: Option<String> = None;
    loop {
        match prompt.ask(title, suggested, error.as_deref()) {
            PromptReply::Cancelled => return None,
            PromptReply::Submitted(raw) => match validate_table_name(&raw) {
                Ok(name) => return Some(name),
                Err(e) => error = Some(e.to_string()),
            },
        }
    }
}

/// Prompt that always answers with a fixed name, for non-interactive callers.
#[derive(Debug, Clone)]
pub struct FixedName(pub String);

impl NamePrompt for FixedName {
    fn ask(&mut self, _title: &str, _suggested: &str, error: Option<&str>) -> PromptReply {
        if error.is_some() {
            // A rejected fixed name would be rejected forever
            return PromptReply::Cancelled;
        }
        PromptReply::Submitted(self.0.clone())
    }
}

/// Prompt that accepts whatever was suggested.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptSuggested;

impl NamePrompt for AcceptSuggested {
    fn ask(&mut self, _title: &str, suggested: &str, _error: Option<&str>) -> PromptReply {
        PromptReply::Submitted(suggested.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays canned replies and records what it was shown.
    struct Scripted {
        replies: Vec<PromptReply>,
        shown_errors: Vec<Option<String>>,
    }

    impl NamePrompt for Scripted {
        fn ask(&mut self, _title: &str, _suggested: &str, error: Option<&str>) -> PromptReply {
            self.shown_errors.push(error.map(|s| s.to_string()));
            if self.replies.is_empty() {
                PromptReply::Cancelled
            } else {
                self.replies.remove(0)
            }
        }
    }

    #[test]
    fn test_validate_trims() {
        assert_eq!(validate_table_name("  Combined ").unwrap(), "Combined");
        assert!(matches!(validate_table_name("   "), Err(MergeError::Validation(_))));
    }

    #[test]
    fn test_empty_name_reprompts_with_error() {
        let mut prompt = Scripted {
            replies: vec![
                PromptReply::Submitted("  ".into()),
                PromptReply::Submitted("Combined".into()),
            ],
            shown_errors: Vec::new(),
        };
        let name = request_table_name(&mut prompt, "Name", "Merged");
        assert_eq!(name.as_deref(), Some("Combined"));
        assert_eq!(prompt.shown_errors.len(), 2);
        assert!(prompt.shown_errors[0].is_none());
        assert!(prompt.shown_errors[1].as_deref().unwrap().contains("table name"));
    }

    #[test]
    fn test_cancel() {
        let mut prompt = Scripted {
            replies: vec![PromptReply::Cancelled],
            shown_errors: Vec::new(),
        };
        assert_eq!(request_table_name(&mut prompt, "Name", "Merged"), None);
    }

    #[test]
    fn test_fixed_name_blank_cancels() {
        let mut prompt = FixedName("   ".into());
        assert_eq!(request_table_name(&mut prompt, "Name", "Merged"), None);
    }

    #[test]
    fn test_accept_suggested() {
        let mut prompt = AcceptSuggested;
        assert_eq!(
            request_table_name(&mut prompt, "Name", "Merged").as_deref(),
            Some("Merged")
        );
    }
}
