use crate::domain::model::WktCrsInfo;
use regex::Regex;
use std::sync::LazyLock;

static WKT_NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(COMPD_CS|COMPOUNDCRS|PROJCS|PROJCRS|GEOGCS|GEOGCRS|BASEGEOGCRS|VERT_CS|VERTCRS|VERT_DATUM|VDATUM|VERTICALDATUM|DATUM|GEODETICDATUM|SPHEROID|ELLIPSOID|PROJECTION|METHOD)\s*[\[(]\s*"([^"]*)""#,
    )
    .expect("WKT keyword pattern is valid")
});

impl WktCrsInfo {
    /// Names of the first node of each kind in a WKT1 or WKT2 definition.
    pub fn parse(wkt: &str) -> Self {
        let mut info = WktCrsInfo::default();

        for caps in WKT_NODE.captures_iter(wkt) {
            let name = caps[2].to_string();
            let slot = match caps[1].to_ascii_uppercase().as_str() {
                "COMPD_CS" | "COMPOUNDCRS" => &mut info.compd_cs,
                "PROJCS" | "PROJCRS" => &mut info.proj_cs,
                "GEOGCS" | "GEOGCRS" | "BASEGEOGCRS" => &mut info.geog_cs,
                "VERT_CS" | "VERTCRS" => &mut info.vert_cs,
                "VERT_DATUM" | "VDATUM" | "VERTICALDATUM" => &mut info.vert_datum,
                "DATUM" | "GEODETICDATUM" => &mut info.hz_datum,
                "SPHEROID" | "ELLIPSOID" => &mut info.spheroid,
                "PROJECTION" | "METHOD" => &mut info.projection,
                _ => continue,
            };
            if slot.is_empty() {
                *slot = name;
            }
        }

        info
    }

    pub fn is_empty(&self) -> bool {
        *self == WktCrsInfo::default()
    }
}
