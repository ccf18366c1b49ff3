//! Output formatting for CLI display.

use crate::animation::{
    AnimationState, BodyKind, Frame, SLOT_COUNT, Transform, body_asset, head_asset,
};
use crate::model::{ActivityLog, Goodie, PetState, STAT_MAX, Stats};
use crate::session::FlushOutcome;

const BAR_WIDTH: usize = 10;

/// A fixed-width bar for a stat, e.g. `[######----]`.
pub(super) fn stat_bar(value: u8) -> String {
    let filled = usize::from(value.min(STAT_MAX)) * BAR_WIDTH / usize::from(STAT_MAX);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub(super) fn format_stats(stats: &Stats) -> String {
    [
        ("mood", stats.mood),
        ("stomach", stats.stomach),
        ("energy", stats.energy),
        ("health", stats.health),
    ]
    .iter()
    .map(|(name, value)| format!("{name:<8} {} {value:>3}", stat_bar(*value)))
    .collect::<Vec<_>>()
    .join("\n")
}

/// The status block: who, where, stats, coins.
pub(super) fn format_status(state: &PetState, animation: AnimationState) -> String {
    let mut out = format!(
        "{} (breed {}) in {}  [{}]\n",
        state.pet,
        state.breed,
        state.space,
        animation.as_str()
    );
    out.push_str(&format_stats(&state.stats));
    out.push_str(&format!("\ncoins    {}", state.coin));
    if state.boarding {
        out.push_str("\n(boarding)");
    }
    for (label, value) in [
        ("id", &state.id),
        ("owner", &state.owner_id),
        ("adopted by", &state.created_by_client_id),
    ] {
        if let Some(value) = value {
            out.push_str(&format!("\n{label:<8} {value}"));
        }
    }
    out
}

/// The newest `limit` log entries, one per line.
pub(super) fn format_log(log: &ActivityLog, limit: usize) -> Vec<String> {
    log.entries()
        .take(limit)
        .map(|(activity, time, user)| format!("{time}  {user:<12} {activity}"))
        .collect()
}

pub(super) fn format_goodies(owned: &[Goodie], equipped: &[bool]) -> Vec<String> {
    owned
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let on = equipped.get(i).copied().unwrap_or(false);
            let mark = if on { "*" } else { " " };
            format!("{mark} goodie {:<4} slot {}", g.id, g.kind)
        })
        .collect()
}

/// One line describing what the pet looks like right now.
pub(super) fn format_frame(frame: &Frame, breed: u32) -> String {
    let mut out = format!(
        "[{}] {} {}",
        frame.state.as_str(),
        head_asset(breed, frame.head_sprite),
        body_asset(breed, frame.body, frame.body_sprite),
    );
    if frame.show_food {
        out.push_str(" +food");
    }
    if frame.body == BodyKind::Sleep {
        out.push_str(" zzz");
    }
    if !frame.hearts.is_empty() {
        out.push_str(&format!(" hearts x{}", frame.hearts.len()));
    }
    out
}

fn format_transform(t: &Transform) -> String {
    format!("x {:>6.1} y {:>6.1} rot {:>6.1}", t.x, t.y, t.rotate)
}

/// Everything in a frame, for `look`: head, worn goodies, hearts.
pub(super) fn describe_frame(frame: &Frame, breed: u32, worn: &[Goodie]) -> Vec<String> {
    let mut lines = vec![format_frame(frame, breed)];
    lines.push(format!("head       {}", format_transform(&frame.head)));

    if frame.show_goodies {
        for goodie in worn {
            // Goodie kinds are 1-based slot numbers.
            let Some(slot) = usize::try_from(goodie.kind)
                .ok()
                .and_then(|k| k.checked_sub(1))
                .filter(|s| *s < SLOT_COUNT)
            else {
                continue;
            };
            lines.push(format!(
                "goodie {:<3} {}",
                goodie.id,
                format_transform(&frame.slots[slot])
            ));
        }
    }

    for heart in &frame.hearts {
        lines.push(format!(
            "heart {:<4} {} opacity {:.2} scale {:.2}",
            heart.id,
            format_transform(&Transform {
                x: heart.x,
                y: heart.y,
                rotate: heart.rotate,
            }),
            heart.opacity,
            heart.scale
        ));
    }
    lines
}

/// A message for a flush result, or `None` when there is nothing to say.
pub(super) fn format_flush(outcome: FlushOutcome) -> Option<String> {
    match outcome {
        FlushOutcome::Nothing => None,
        FlushOutcome::InFlight => Some("sync already in progress".to_string()),
        FlushOutcome::Sent(1) => Some("synced 1 action".to_string()),
        FlushOutcome::Sent(n) => Some(format!("synced {n} actions")),
        FlushOutcome::Failed => Some("sync failed; will retry later".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::animation::Animator;
    use crate::care::tests::sample_state;
    use crate::model::starter_goodies;
    use jiff::Timestamp;

    #[test]
    fn stat_bar_scales() {
        assert_eq!(stat_bar(0), "[----------]");
        assert_eq!(stat_bar(55), "[#####-----]");
        assert_eq!(stat_bar(100), "[##########]");
    }

    #[test]
    fn status_lists_everything() {
        let status = format_status(&sample_state(), AnimationState::Idle);
        assert!(status.starts_with("Biscuit (breed 3) in blue-otter  [idle]"));
        assert!(status.contains("health   [########--]  80"));
        assert!(status.contains("\ncoins    10\n"));
        assert!(status.ends_with("id       p-1"));
    }

    #[test]
    fn status_shows_ownership_when_known() {
        let mut state = sample_state();
        state.owner_id = Some("u-7".into());
        state.created_by_client_id = Some("cid".into());

        let status = format_status(&state, AnimationState::Idle);
        assert!(status.contains("\nowner    u-7"));
        assert!(status.ends_with("adopted by cid"));
    }

    #[test]
    fn log_newest_first_and_limited() {
        let mut log = ActivityLog::default();
        log.prepend("feed", "t1", "ann");
        log.prepend("toy", "t2", "bob");

        let lines = format_log(&log, 1);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("t2  bob"));
        assert!(lines[0].ends_with("toy"));
    }

    #[test]
    fn goodies_mark_worn() {
        let lines = format_goodies(&starter_goodies(), &[false, true]);
        assert_eq!(lines[1], "* goodie 23   slot 2");
        assert!(lines[2].starts_with("  goodie 31"));
    }

    #[test]
    fn sleeping_frame_line() {
        let t = Timestamp::from_millisecond(0).unwrap();
        let frame = Animator::new(1, t).frame(t);
        assert_eq!(
            format_frame(&frame, 4),
            "[sleeping] breed4-head-2.png breed4-sleep-1.png zzz"
        );
    }

    #[test]
    fn look_lists_worn_goodies_in_their_slots() {
        let t = Timestamp::from_millisecond(0).unwrap();
        let mut anim = Animator::new(50, t);
        anim.trigger(AnimationState::Eating, t);
        let worn = [Goodie { id: 23, kind: 2 }, Goodie { id: 99, kind: 9 }];

        let lines = describe_frame(&anim.frame(t), 0, &worn);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "head       x   -5.0 y   40.0 rot   13.0");
        assert_eq!(lines[2], "goodie 23  x   15.0 y   40.0 rot   28.0");
    }

    #[test]
    fn look_hides_goodies_while_asleep() {
        let t = Timestamp::from_millisecond(0).unwrap();
        let frame = Animator::new(1, t).frame(t);

        let lines = describe_frame(&frame, 0, &[Goodie { id: 23, kind: 2 }]);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn flush_messages() {
        assert_eq!(format_flush(FlushOutcome::Nothing), None);
        assert_eq!(format_flush(FlushOutcome::Sent(1)).unwrap(), "synced 1 action");
        assert_eq!(format_flush(FlushOutcome::Sent(3)).unwrap(), "synced 3 actions");
    }
}
