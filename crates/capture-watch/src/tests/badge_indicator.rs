use crate::BadgeIndicator;

use capture_watch_core::{Indicator, IndicatorState, TabId};

fn state(text: &str) -> IndicatorState {
    IndicatorState {
        text: text.to_string(),
        color: "#d9534f".to_string(),
    }
}

/// WHAT: A recording badge is shown and then cleared
/// WHY: The badge must track the Coordinator's updates exactly
#[test]
fn given_badge_when_recording_then_cleared_then_badge_removed() {
    // Given: No badges
    let badges = BadgeIndicator::new();
    let tab = TabId(4);
    assert_eq!(badges.badge(tab), None);

    // When: The Coordinator shows REC
    badges.apply(tab, &state("REC"));

    // Then: The badge is visible
    assert_eq!(badges.badge(tab), Some(state("REC")));
    assert_eq!(badges.describe(tab), "Capture-Watch - tab 4 [REC]");

    // When: The Coordinator clears it
    badges.apply(tab, &state(""));

    // Then: Nothing shown
    assert_eq!(badges.badge(tab), None);
    assert_eq!(badges.describe(tab), "Capture-Watch - tab 4 clear");
}

/// WHAT: Badges are independent per tab
/// WHY: Clearing one tab must not touch another
#[test]
fn given_two_tabs_when_one_cleared_then_other_kept() {
    let badges = BadgeIndicator::new();

    badges.apply(TabId(1), &state("REC"));
    badges.apply(TabId(2), &state("REC"));
    badges.apply(TabId(1), &state(""));

    assert_eq!(badges.badge(TabId(1)), None);
    assert_eq!(badges.badge(TabId(2)), Some(state("REC")));
}
