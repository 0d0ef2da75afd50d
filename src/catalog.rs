// src/catalog.rs
//
// Static table mapping detection class names to sign presentation data.
// Adding a new sign type is a one-line edit to SIGN_TABLE.

use std::collections::HashMap;
use std::time::Duration;

/// Presentation and speech content for one traffic sign class.
#[derive(Debug, Clone)]
pub struct SignDefinition {
    /// Lower-cased detector class name.
    pub class_name: &'static str,
    /// Image shown in the alert bar.
    pub image: &'static str,
    /// Display label; also the dedup key for active alerts.
    pub label: &'static str,
    /// Spoken alert text.
    pub message: &'static str,
    pub speed_limit: bool,
    /// Optional per-sign alert duration; falls back to the registry default.
    pub hold_override: Option<Duration>,
}

const fn sign(
    class_name: &'static str,
    image: &'static str,
    label: &'static str,
    message: &'static str,
    speed_limit: bool,
) -> SignDefinition {
    SignDefinition {
        class_name,
        image,
        label,
        message,
        speed_limit,
        hold_override: None,
    }
}

/// Every class the detector can emit. Unknown names are skipped upstream.
static SIGN_TABLE: [SignDefinition; 15] = [
    sign("300mtoleftexit", "assets/300mToLeftExit.png", "300米左側出口", "距離300米左側出口", false),
    sign("dangerous", "assets/Dangerous.png", "危險", "前方有危險！請小心駕駛。", false),
    sign("noparkingend", "assets/NoParkingEnd.png", "禁止停車區域結束", "禁止停車區域結束。", false),
    sign("noparkinggreen", "assets/NoParkingGreen.png", "禁止停車（綠色標誌）", "禁止停車（綠色標誌）。", false),
    sign("noparkingred", "assets/NoParkingRed.png", "禁止停車（紅色標誌）", "禁止停車（紅色標誌）。", false),
    sign("noparkingyellow", "assets/NoParkingYellow.png", "禁止停車（黃色標誌）", "禁止停車（黃色標誌）。", false),
    sign("roadnarrowsblocked", "assets/RoadNarrowsBlocked.png", "前方道路收窄並被阻塞", "前方道路收窄並被阻塞。", false),
    sign("roadnarrowsboth", "assets/RoadNarrowsBoth.png", "前方道路雙側收窄", "前方道路雙側收窄。", false),
    sign("roadnarrowsright", "assets/RoadNarrowsRight.png", "前方道路右側收窄", "前方道路右側收窄。", false),
    sign("speed50km", "assets/Speed50km.png", "前方限速50公里", "前方限速50公里。", true),
    sign("speed70km", "assets/Speed70km.png", "前方限速70公里", "前方限速70公里。", true),
    sign("speed80km", "assets/Speed80km.png", "前方限速80公里", "前方限速80公里。", true),
    sign("speed100km", "assets/Speed100km.png", "前方限速100公里", "前方限速100公里。", true),
    sign("speed110km", "assets/Speed110km.png", "前方限速110公里", "前方限速110公里。", true),
    sign("roadworks", "assets/RoadWork.png", "前方有道路工程", "前方有道路工程。", false),
];

/// Immutable class-name → SignDefinition lookup. Built once at startup.
pub struct SignCatalog {
    signs: HashMap<&'static str, &'static SignDefinition>,
}

impl SignCatalog {
    pub fn new() -> Self {
        let signs = SIGN_TABLE.iter().map(|s| (s.class_name, s)).collect();
        Self { signs }
    }

    /// Case-insensitive lookup. None means the class is not a traffic sign
    /// we alert on; callers log and move on.
    pub fn lookup(&self, class_name: &str) -> Option<&'static SignDefinition> {
        self.signs.get(class_name.to_lowercase().as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.signs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signs.is_empty()
    }
}

impl Default for SignCatalog {
    fn default() -> Self {
        Self::new()
    }
}
