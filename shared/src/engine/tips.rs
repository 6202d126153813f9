//! Advisory tips for factors that did not match
//!
//! Tips never feed back into the score.

use std::collections::BTreeMap;

use super::scoring::FactorAssessment;
use crate::models::{Factor, Improvement};

const ALL_GOOD_TIP: &str = "Alle Bedingungen passen, gute Fangchancen!";

fn tip_for(assessment: &FactorAssessment) -> Option<String> {
    let current = &assessment.current;
    let recommended = &assessment.recommended;
    let tip = match assessment.factor {
        Factor::TempDepthMatch => format!(
            "Temperatur und Tiefe passen nicht ({current}), besser {recommended}"
        ),
        Factor::WindDirection => format!("Windrichtung {current} ungünstig, besser {recommended}"),
        Factor::Turbidity => format!("Wasser ist {current}, bevorzugt {recommended}"),
        Factor::Windy => format!("Zu wenig Wind ({current}), ideal {recommended}"),
        Factor::MoonPhase => format!("Mondphase {current} ungünstig, besser {recommended}"),
        Factor::Season => format!("Außerhalb der besten Fangsaison ({recommended})"),
        Factor::CloudCover => format!("Himmel {current}, bevorzugt {recommended}"),
        Factor::RainBonus => "Kein Regen, diese Art beißt bei Regen besser".to_string(),
        Factor::PressureTrend => {
            format!("Luftdruck {current}, bevorzugt {recommended}")
        }
        Factor::TimeOfDay => format!("Außerhalb der besten Tageszeit, besser {recommended}"),
        Factor::RainMalus => format!("Starkregen ({current}) senkt die Fangchancen"),
        Factor::Temperature | Factor::Depth | Factor::NightBoost => return None,
    };
    Some(tip)
}

/// Join the tips for every unmatched factor and collect the structured
/// improvements keyed by factor. With nothing to improve a single positive
/// tip is returned. An active closed season adds a notice either way.
pub fn build_tips(
    assessments: &[FactorAssessment],
    closed_season_active: Option<bool>,
    closed_season: Option<&str>,
) -> (String, BTreeMap<String, Improvement>) {
    let mut tips = Vec::new();
    let mut improvements = BTreeMap::new();

    for assessment in assessments.iter().filter(|a| !a.matched) {
        let Some(tip) = tip_for(assessment) else {
            continue;
        };
        tips.push(tip);
        improvements.insert(
            assessment.factor.key().to_string(),
            Improvement {
                current: assessment.current.clone(),
                recommended: assessment.recommended.clone(),
            },
        );
    }

    if tips.is_empty() {
        tips.push(ALL_GOOD_TIP.to_string());
    }
    if closed_season_active == Some(true) {
        let span = closed_season.unwrap_or_default();
        tips.push(format!("Schonzeit aktiv ({span}), Fang nicht erlaubt"));
    }

    (tips.join("; "), improvements)
}
