use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "tr")]
    Turkish,
    #[serde(rename = "en")]
    English,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Turkish => "tr",
            Language::English => "en",
        }
    }

    /// Name shown in the language selector, in the language itself.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Turkish => "Türkçe",
            Language::English => "English",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Language::Turkish => Language::English,
            Language::English => Language::Turkish,
        }
    }

    pub fn strings(self) -> &'static Strings {
        match self {
            Language::Turkish => &TURKISH,
            Language::English => &ENGLISH,
        }
    }
}

pub struct Strings {
    pub window_title: &'static str,
    pub connection_status: &'static str,
    pub connection_measuring: &'static str,
    pub connection_completed: &'static str,
    pub connection_error: &'static str,
    pub ping: &'static str,
    pub download: &'static str,
    pub upload: &'static str,
    pub start: &'static str,
    pub about: &'static str,
    pub close: &'static str,
    pub language: &'static str,
    pub settings: &'static str,
    pub unit: &'static str,
    pub ping_samples: &'static str,
    pub download_size: &'static str,
    pub upload_size: &'static str,
    pub quit: &'static str,
    pub speedtest_failed: &'static str,
    pub settings_help: &'static str,
    pub about_text: &'static [&'static str],
}

static TURKISH: Strings = Strings {
    window_title: "Runner SpeedTest",
    connection_status: "Bağlantı Durumu: Bağlantı Bekleniyor...",
    connection_measuring: "Bağlantı Durumu: Ölçüyor...",
    connection_completed: "Bağlantı Durumu: Tamamlandı",
    connection_error: "Bağlantı Durumu: Hata!",
    ping: "Ping",
    download: "İndirme",
    upload: "Yükleme",
    start: "Başlat",
    about: "Hakkında",
    close: "Kapat",
    language: "Dil",
    settings: "Ayarlar",
    unit: "Birim",
    ping_samples: "Ping örnekleri",
    download_size: "İndirme boyutu",
    upload_size: "Yükleme boyutu",
    quit: "Çıkış",
    speedtest_failed: "Speedtest başarısız",
    settings_help: "↑↓ seç · ←→ değiştir · enter tamam",
    about_text: &[
        "Runner SpeedTest",
        "",
        "Bu uygulama, internet bağlantı hızınızı ölçmek için geliştirilmiştir.",
        "",
        "Geliştirici: ALG Yazılım Inc.©",
        "www.algyazilim.com | info@algyazilim.com",
        "",
        "ALG Yazılım Pardus'a Göç'ü Destekler.",
        "",
        concat!("Sürüm: ", env!("CARGO_PKG_VERSION")),
    ],
};

static ENGLISH: Strings = Strings {
    window_title: "Runner SpeedTest",
    connection_status: "Connection Status: Waiting for Connection...",
    connection_measuring: "Connection Status: Measuring...",
    connection_completed: "Connection Status: Completed",
    connection_error: "Connection Status: Error!",
    ping: "Ping",
    download: "Download",
    upload: "Upload",
    start: "Start",
    about: "About",
    close: "Close",
    language: "Language",
    settings: "Settings",
    unit: "Unit",
    ping_samples: "Ping samples",
    download_size: "Download size",
    upload_size: "Upload size",
    quit: "Quit",
    speedtest_failed: "Speedtest failed",
    settings_help: "↑↓ select · ←→ adjust · enter done",
    about_text: &[
        "Runner SpeedTest",
        "",
        "This application is developed to measure your internet connection speed.",
        "",
        "Developer: ALG Yazılım Inc.©",
        "www.algyazilim.com | info@algyazilim.com",
        "",
        "ALG Yazılım Supports Migration to Pardus.",
        "",
        concat!("Version: ", env!("CARGO_PKG_VERSION")),
    ],
};
