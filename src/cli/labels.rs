use crate::core::config::Language;

/// User-facing text for one language.
#[derive(Debug, PartialEq, Eq)]
pub struct Labels {
    pub app_title: &'static str,
    pub rates_title: &'static str,
    pub currency: &'static str,
    pub rate: &'static str,
    pub last_updated: &'static str,
    pub history: &'static str,
    pub date: &'static str,
    pub time: &'static str,
    pub amount: &'static str,
    pub result: &'static str,
    pub empty_history: &'static str,
    pub history_cleared: &'static str,
    pub auto_rate: &'static str,
    pub manual_rate: &'static str,
    pub rate_unavailable: &'static str,
    pub enter_rate: &'static str,
    pub save_failed: &'static str,
}

static EN: Labels = Labels {
    app_title: "KyatFast calculator",
    rates_title: "Market Rates Today",
    currency: "Currency",
    rate: "Rate",
    last_updated: "Last updated:",
    history: "History",
    date: "Date",
    time: "Time",
    amount: "Amount",
    result: "Result",
    empty_history: "No conversions recorded yet.",
    history_cleared: "History cleared.",
    auto_rate: "auto",
    manual_rate: "manual",
    rate_unavailable: "Rate unavailable for",
    enter_rate: "enter one manually",
    save_failed: "Could not save to history",
};

static MM: Labels = Labels {
    app_title: "ငွေလဲနှုန်း တွက်ချက်စက်",
    rates_title: "ပေါက်ဈေးများ",
    currency: "ငွေကြေး",
    rate: "ပေါက်ဈေး",
    last_updated: "နောက်ဆုံးချိန်ညှိ:",
    history: "မှတ်တမ်း",
    date: "ရက်စွဲ",
    time: "အချိန်",
    amount: "ပမာဏ",
    result: "ရလဒ်",
    empty_history: "မှတ်တမ်း မရှိသေးပါ။",
    history_cleared: "မှတ်တမ်းဖျက်ပြီးပါပြီ။",
    auto_rate: "အော်တိုဈေးနှုန်း",
    manual_rate: "ကိုယ့်စိတ်ကြိုက်ဈေး",
    rate_unavailable: "ပေါက်ဈေး မရှိပါ:",
    enter_rate: "ပေါက်ဈေးထည့်ပါ",
    save_failed: "မှတ်တမ်း သိမ်း၍မရပါ",
};

impl Labels {
    pub fn for_language(language: Language) -> &'static Labels {
        match language {
            Language::En => &EN,
            Language::Mm => &MM,
        }
    }

    pub fn rate_mode(&self, is_automatic: bool) -> &'static str {
        if is_automatic {
            self.auto_rate
        } else {
            self.manual_rate
        }
    }
}
