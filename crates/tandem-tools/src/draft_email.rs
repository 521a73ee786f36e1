//! The `draft-email` tool: a templated warm introduction between two people.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ToolError, ToolResult};
use crate::tool::{ToolDefinition, ToolInput, ToolOutput, ToolRegistry};

/// Tool id.
pub const DRAFT_EMAIL: &str = "draft-email";

/// Arguments of the `draft-email` tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEmailInput {
    /// Address of the person being introduced.
    pub recipient_email: String,
    /// Address of the person asking for the introduction.
    pub sender_email: String,
}

/// A drafted e-mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    /// Drafts an introduction of `sender` to `recipient`.
    pub fn introduction(sender: &str, recipient: &str) -> Self {
        let from = local_part(sender);
        let to = local_part(recipient);

        let subject =
            format!("Introducing two amazing professionals: {sender} meet {recipient}");
        let body = format!(
            "Dear {sender} and {recipient},\n\
             \n\
             I hope this email finds you both well. As someone who knows you both, \
             I thought it would be great to introduce you to each other.\n\
             \n\
             {from}, meet {to}. You both have impressive backgrounds in technology and \
             I believe you could benefit from knowing each other. {to} has been doing \
             groundbreaking work in AI, while {from} has been innovating in the field \
             of blockchain.\n\
             \n\
             {to}, {from} is not only a talented professional but also a great person \
             to brainstorm with. I think you'll find their insights on emerging tech \
             trends particularly valuable.\n\
             \n\
             I'll leave it to you both to take it from here. Perhaps you could set up \
             a virtual coffee chat to explore potential collaborations or simply \
             exchange ideas.\n\
             \n\
             Best regards,\n\
             Your AI Matchmaker"
        );

        Self { subject, body }
    }
}

/// Name used to address someone: the e-mail address up to the `@`.
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Drafts warm introduction e-mails. Makes no outbound calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct DraftEmailTool;

impl DraftEmailTool {
    /// Definition advertised to the agent host.
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            DRAFT_EMAIL,
            "Draft Email",
            "Generate a draft email for a warm introduction between two professionals \
             when the user asks to create a new mail",
            json!({
                "type": "object",
                "properties": {
                    "recipientEmail": {
                        "type": "string",
                        "description": "Email address of the recipient"
                    },
                    "senderEmail": {
                        "type": "string",
                        "description": "Email address of the sender"
                    }
                },
                "required": ["recipientEmail", "senderEmail"]
            }),
        )
    }

    /// Adds the tool to `registry`.
    pub fn register(self, registry: &mut ToolRegistry) {
        registry.register_fn(Self::definition(), move |input| async move {
            self.call(input)
        });
    }

    /// Runs the tool.
    pub fn call(&self, input: ToolInput) -> ToolResult<ToolOutput> {
        let input: DraftEmailInput = input.parse()?;
        if input.sender_email.trim().is_empty() || input.recipient_email.trim().is_empty() {
            return Err(ToolError::invalid_input(
                "senderEmail and recipientEmail must not be empty",
            ));
        }

        let draft = EmailDraft::introduction(&input.sender_email, &input.recipient_email);
        let text = format!(
            "Generated warm introduction email for {} and {}",
            input.sender_email, input.recipient_email
        );

        Ok(ToolOutput::new(
            text,
            json!({ "subject": draft.subject, "body": draft.body }),
        ))
    }
}
