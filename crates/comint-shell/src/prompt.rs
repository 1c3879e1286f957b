//! Prompt and password prompt detection

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Anything up to the first `#`, `$`, `%` or `>` on a line
pub const DEFAULT_PROMPT_REGEX: &str = r"^[^#$%>\n]*[#$%>] *";

/// Words that may lead into a password prompt
const PASSWORD_INTROS: &[&str] = &[
    "Enter", "enter", "Enter same", "enter same", "Enter the", "enter the", "Current",
    "Enter Auth", "enter auth", "Old", "old", "New", "new", "'s", "login", "Kerberos", "CVS",
    "UNIX", " SMB", "LDAP", "PEM", "SUDO", r"\[sudo\]", "doas", "Repeat", "Bad", "Retype",
    "Verify",
];

/// "password" in the languages emacs knows about
const PASSWORD_WORDS: &[&str] = &[
    "password", "passcode", "passphrase", "pass phrase", "pin",
    "암호", "パスワード", "ପ୍ରବେଶ ସଙ୍କେତ", "ពាក្យសម្ងាត់", "adgangskode", "contraseña",
    "contrasenya", "geslo", "hasło", "heslo", "iphasiwedi", "jelszó", "lösenord", "lozinka",
    "mật khẩu", "mot de passe", "parola", "pasahitza", "passord", "passwort", "pasvorto",
    "salasana", "senha", "slaptažodis", "wachtwoord", "كلمة السر", "ססמה", "лозинка",
    "пароль", "गुप्तशब्द", "शब्दकूट", "પાસવર્ડ", "సంకేతపదము", "ਪਾਸਵਰਡ", "ಗುಪ್ತಪದ",
    "கடவுச்சொல்", "അടയാളവാക്ക്", "গুপ্তশব্দ", "পাসওয়ার্ড", "රහස්පදය", "密码", "密碼",
    "Response",
];

static PASSWORD_PROMPT_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        concat!(
            r"(?i)(?:",
            r"(?:^ *|(?:{intros}) +.*)",
            r"(?:{words})",
            r"(?:(?:, try)? *again| \(empty for no passphrase\)| \(again\))?",
            r"(?: \w+ .+)?[ \t]*[:：៖]\s*",
            r"|^Enter encryption key: \(repeat\) *",
            r")\z",
        ),
        intros = PASSWORD_INTROS.join("|"),
        words = PASSWORD_WORDS.join("|"),
    );
    Regex::new(&pattern).expect("password prompt pattern is valid")
});

/// The password prompt the content ends with, if any. Only the last
/// non-blank line is considered, and the match must run to the end.
pub fn password_prompt(content: &str) -> Option<&str> {
    let trimmed = content.trim_end();
    let line_start = trimmed.rfind('\n').map_or(0, |i| i + 1);
    PASSWORD_PROMPT_RE
        .find(&content[line_start..])
        .map(|m| m.as_str().trim())
}

/// Finds shell prompts in the transcript
#[derive(Debug, Clone)]
pub struct PromptMatcher {
    regex: Regex,
}

impl Default for PromptMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_REGEX).expect("default prompt pattern is valid")
    }
}

impl PromptMatcher {
    /// Compile a prompt pattern; `^` and `$` match at line boundaries
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).multi_line(true).build()?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Every prompt in `content`, as character ranges
    pub fn ranges(&self, content: &str) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut byte_pos = 0;
        let mut char_pos = 0;

        for m in self.regex.find_iter(content) {
            if m.start() == m.end() {
                continue;
            }
            char_pos += content[byte_pos..m.start()].chars().count();
            let start = char_pos;
            char_pos += m.as_str().chars().count();
            byte_pos = m.end();
            ranges.push(start..char_pos);
        }
        ranges
    }

    /// Whether the text after the last newline looks like a prompt
    pub fn matches_trailing_line(&self, text: &str) -> bool {
        let line_start = text.rfind('\n').map_or(0, |i| i + 1);
        self.regex.is_match(&text[line_start..])
    }
}
