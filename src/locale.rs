//! Deployment locale
//!
//! Every user-facing string lives here: the retrieval fallback sentence, the
//! apology shown on failure, status texts, and the system prompt template.
//! The response language is fixed by the locale regardless of the language
//! the user speaks in.

use std::str::FromStr;

use crate::Error;
use crate::view::Status;

/// Language the assistant listens, answers, and speaks in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// `hu-HU`
    #[default]
    Hungarian,
    /// `en-US`
    English,
}

/// Fixed parts of the system instruction for one locale
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    /// Opening role statement
    pub role: &'static str,
    /// The "answer exclusively from the knowledge base" constraint
    pub exclusive: &'static str,
    /// Header preceding the context block
    pub knowledge_header: &'static str,
    /// Header preceding the numbered rules
    pub rules_header: &'static str,
    /// Decline, no fabrication, speech style, response language
    pub rules: [&'static str; 4],
}

const HU_TEMPLATE: PromptTemplate = PromptTemplate {
    role: "Te egy segítőkész asszisztens vagy.",
    exclusive: "KIZÁRÓLAG a következő tudásbázis alapján válaszolj:",
    knowledge_header: "### TUDÁSBÁZIS:",
    rules_header: "### SZABÁLYOK:",
    rules: [
        "Ha a válasz nincs benne a tudásbázisban, udvariasan mondd meg, hogy erről nincs információd.",
        "Ne találj ki adatokat (hallucináció tilos).",
        "Válaszolj tömören, beszédstílusban (mivel fel lesz olvasva).",
        "Mindig magyarul válaszolj.",
    ],
};

const EN_TEMPLATE: PromptTemplate = PromptTemplate {
    role: "You are a helpful assistant.",
    exclusive: "Answer EXCLUSIVELY based on the following knowledge base:",
    knowledge_header: "### KNOWLEDGE BASE:",
    rules_header: "### RULES:",
    rules: [
        "If the answer is not in the knowledge base, politely say that you have no information about it.",
        "Do not make up any data (hallucination is forbidden).",
        "Answer concisely, in a spoken style (the answer will be read aloud).",
        "Always answer in English.",
    ],
};

impl Locale {
    /// BCP 47 language tag passed to the speech engines
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Hungarian => "hu-HU",
            Self::English => "en-US",
        }
    }

    /// Context block used when no knowledge item matches the query
    #[must_use]
    pub const fn fallback_context(self) -> &'static str {
        match self {
            Self::Hungarian => "Nincs specifikus információm erről a tudásbázisban.",
            Self::English => "I have no specific information about this in the knowledge base.",
        }
    }

    /// Message displayed when a query fails
    #[must_use]
    pub const fn apology(self) -> &'static str {
        match self {
            Self::Hungarian => "Sajnos hiba történt a válaszadás során.",
            Self::English => "Sorry, something went wrong while answering.",
        }
    }

    /// Asks the user to enter an API token
    #[must_use]
    pub const fn credential_prompt(self) -> &'static str {
        match self {
            Self::Hungarian => "Add meg az API kulcsot: /token <kulcs> (vagy: voxkb token set)",
            Self::English => "Enter your API token: /token <token> (or: voxkb token set)",
        }
    }

    /// Human-readable text for a status value
    #[must_use]
    pub const fn status_text(self, status: Status) -> &'static str {
        match (self, status) {
            (Self::Hungarian, Status::Ready) => "Készen áll a kérdésre...",
            (Self::Hungarian, Status::Listening) => "Figyelek...",
            (Self::Hungarian, Status::Processing) => "Feldolgozás...",
            (Self::Hungarian, Status::MissingCredential) => "Hiányzó API kulcs",
            (Self::Hungarian, Status::Error) => "Hiba történt.",
            (Self::Hungarian, Status::NotSupported) => {
                "A környezet nem támogatja a beszédfelismerést."
            }
            (Self::English, Status::Ready) => "Ready for your question...",
            (Self::English, Status::Listening) => "Listening...",
            (Self::English, Status::Processing) => "Processing...",
            (Self::English, Status::MissingCredential) => "Missing API key",
            (Self::English, Status::Error) => "An error occurred.",
            (Self::English, Status::NotSupported) => {
                "Speech recognition is not supported in this environment."
            }
        }
    }

    /// System prompt template
    #[must_use]
    pub const fn prompt_template(self) -> &'static PromptTemplate {
        match self {
            Self::Hungarian => &HU_TEMPLATE,
            Self::English => &EN_TEMPLATE,
        }
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hu" | "hu-hu" | "hu_hu" | "hungarian" | "magyar" => Ok(Self::Hungarian),
            "en" | "en-us" | "en_us" | "english" => Ok(Self::English),
            other => Err(Error::Config(format!("unsupported locale: {other}"))),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
