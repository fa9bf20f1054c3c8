//! Fixed reply texts and the assistant's system instruction.

use std::sync::LazyLock;

use crate::tax::bracket_lines;

/// Policy prompt seeded as the first entry of every session.
pub static SYSTEM_PROMPT: LazyLock<String> = LazyLock::new(|| {
    format!(
        "You are TaxGuard AI, Pakistan's intelligent tax compliance assistant. You help Pakistani citizens with:
1. Tax filing guidance in Urdu and English
2. Tax calculations based on Pakistani tax laws
3. Deduction recommendations
4. Answering FBR-related questions
5. Explaining tax concepts simply

Guidelines:
- Be helpful, friendly, and professional
- Support both Urdu and English (detect language automatically)
- Provide specific guidance for Pakistani tax system
- Keep responses concise for WhatsApp (under 1500 characters)
- Use simple language, avoid jargon
- When asked about tax calculation, ask for: monthly income, profession, city
- Suggest legitimate deductions based on profession
- If asked about receipts/documents, explain you can process them via photo upload

Pakistani Tax Brackets 2024-25:
{brackets}

Common deductions:
- Zakat/charitable donations (up to 30% of taxable income)
- Education expenses for children
- Medical expenses
- Pension contributions
- Life insurance premiums
",
        brackets = bracket_lines()
    )
});

pub const WELCOME_TEXT: &str = "🇵🇰 *TaxGuard AI - خوش آمدید*

Welcome to Pakistan's intelligent tax assistant!

I can help you with:
✅ Tax calculations / ٹیکس کا حساب
✅ Filing guidance / فائلنگ کی رہنمائی
✅ Deduction tips / کٹوتیوں کی تجاویز
✅ FBR questions / ایف بی آر کے سوالات

Try asking:
• \"Mera tax calculate karo\" (میرا ٹیکس)
• \"How do I file tax return?\"
• \"What deductions can I claim?\"

*Type your question in Urdu or English!* 🤖";

pub const CALCULATION_TEXT: &str = "💰 *Tax Calculation*

Please provide:
1️⃣ Your monthly salary (e.g., \"50000\")
2️⃣ Your profession (e.g., \"software engineer\")
3️⃣ Your city (e.g., \"Karachi\")

Example: \"Monthly income 80000, software engineer, Islamabad\"

براہ کرم بتائیں:
ماہانہ تنخواہ، پیشہ، شہر";

pub const TOO_SHORT_TEXT: &str = "Please send a complete message. / براہ کرم مکمل پیغام بھیجیں۔";

pub const UNSUPPORTED_MESSAGE_TEXT: &str =
    "Sorry, I can only process text messages at the moment.";

pub const NOT_CONFIGURED_TEXT: &str =
    "معذرت / Sorry, AI service is not configured. Please contact administrator.";

const APOLOGY_TEXT: &str =
    "معذرت / Sorry, I'm experiencing technical difficulties. Please try again.";

/// Suffix appended to every LLM-path reply.
pub const SIGNATURE: &str = "\n\n_- TaxGuard AI 🤖_";

/// Apology sent when the provider call fails.
pub fn apology(detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{APOLOGY_TEXT} Error: {detail}"),
        None => APOLOGY_TEXT.to_string(),
    }
}

/// Append the TaxGuard signature.
pub fn signed(text: &str) -> String {
    format!("{text}{SIGNATURE}")
}
