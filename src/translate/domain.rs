//! Translation domains and their prompt templates.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Subject area of the source text, selecting the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Domain {
    #[default]
    General,
    Scientific,
    Genetic,
    Medical,
    Legal,
    Technical,
}

const GENERAL: &str = "Translate the following English text to Persian (Farsi). Only provide the translation, no explanations or additional text, just translate the text directly:

{text}";

const INTRO: &str = "متن زیر را از زبان انگلیسی به زبان فارسی به صورت حرفه‌ای و دقیق ترجمه کن. در ترجمه به موارد زیر توجه کن:";

const OUTRO: &str = "فقط متن ترجمه شده را بازگردان، بدون هیچ توضیح اضافی:";

const SHARED_RULES: &str = "3. اطمینان از صحت ساختار جملات به گونه‌ای که هم از نظر دستوری و هم از نظر مفهومی به بهترین نحو به زبان فارسی منتقل شود.";

const COHERENCE_RULE: &str = "5. رعایت تناسب و انسجام متن به گونه‌ای که همخوانی مفهومی و ساختاری حفظ شود.";

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::General,
        Domain::Scientific,
        Domain::Genetic,
        Domain::Medical,
        Domain::Legal,
        Domain::Technical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::General => "general",
            Domain::Scientific => "scientific",
            Domain::Genetic => "genetic",
            Domain::Medical => "medical",
            Domain::Legal => "legal",
            Domain::Technical => "technical",
        }
    }

    /// Domain-specific rules 1, 2 and 4 of the Persian prompts.
    fn rules(&self) -> Option<[&'static str; 3]> {
        let rules = match self {
            Domain::General => return None,
            Domain::Scientific => [
                "1. استفاده از اصطلاحات و واژگان تخصصی دقیق در حوزه علمی مربوطه و رعایت استانداردهای علمی پذیرفته‌شده.",
                "2. حفظ سبک علمی، دانشگاهی و تخصصی متن اصلی بدون تغییر معنا یا ابهام در مفاهیم.",
                "4. در صورت وجود اصطلاح یا مفهوم دشوار، در صورت امکان ارائه معادل تخصصی مربوطه.",
            ],
            Domain::Genetic => [
                "1. استفاده از اصطلاحات و واژگان تخصصی دقیق در حوزه ژنتیک (مانند DNA، RNA، ژن، اپی‌ژنتیک، موتاسیون و سایر مفاهیم مرتبط) و رعایت استانداردهای علمی پذیرفته‌شده.",
                "2. حفظ سبک علمی، دانشگاهی و تخصصی متن اصلی بدون تغییر معنا یا ابهام در مفاهیم.",
                "4. در صورت وجود اصطلاح یا مفهوم دشوار، در صورت امکان ارائه معادل تخصصی مربوطه.",
            ],
            Domain::Medical => [
                "1. استفاده از اصطلاحات و واژگان تخصصی دقیق در حوزه پزشکی و علوم زیستی و رعایت استانداردهای علمی پزشکی پذیرفته‌شده.",
                "2. حفظ سبک علمی، دانشگاهی و تخصصی پزشکی متن اصلی بدون تغییر معنا یا ابهام در مفاهیم.",
                "4. در صورت وجود اصطلاح یا مفهوم دشوار پزشکی، در صورت امکان ارائه معادل تخصصی مربوطه.",
            ],
            Domain::Legal => [
                "1. استفاده از اصطلاحات و واژگان تخصصی دقیق در حوزه حقوقی و قانونی و رعایت استانداردهای حقوقی پذیرفته‌شده.",
                "2. حفظ سبک رسمی، حقوقی و تخصصی متن اصلی بدون تغییر معنا یا ابهام در مفاهیم قانونی.",
                "4. در صورت وجود اصطلاح یا مفهوم دشوار حقوقی، در صورت امکان ارائه معادل تخصصی مربوطه.",
            ],
            Domain::Technical => [
                "1. استفاده از اصطلاحات و واژگان تخصصی دقیق در حوزه فنی و مهندسی و رعایت استانداردهای فنی پذیرفته‌شده.",
                "2. حفظ سبک فنی و تخصصی متن اصلی بدون تغییر معنا یا ابهام در مفاهیم مهندسی.",
                "4. در صورت وجود اصطلاح یا مفهوم دشوار فنی، در صورت امکان ارائه معادل تخصصی مربوطه.",
            ],
        };
        Some(rules)
    }

    /// Prompt template with a `{text}` placeholder.
    pub fn template(&self) -> String {
        match self.rules() {
            None => GENERAL.to_string(),
            Some([first, second, fourth]) => format!(
                "{INTRO}\n\n{first}\n{second}\n{SHARED_RULES}\n{fourth}\n{COHERENCE_RULE}\n\n{OUTRO}\n\n{{text}}"
            ),
        }
    }

    /// The prompt for `text`.
    pub fn prompt(&self, text: &str) -> String {
        self.template().replace("{text}", text)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = Domain::ALL.iter().map(Domain::as_str).collect();
                Error::Other(format!(
                    "Invalid domain: {}. Valid domains are: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}
