//! # Schedule
//! Minutes until an alarm slot next fires.

use crate::profile::AlarmTime;
use crate::rtc::DateTime;

/// Minutes from `now` until an alarm at `time` on the days in `dow_mask` fires.
///
/// The scan starts at today and walks at most one week forward. Today only
/// counts while the alarm time is still ahead, or exactly now when
/// `match_now` is set (which yields 0). An empty mask never fires and
/// returns `None`.
#[must_use]
pub fn next_alarm_offset(time: AlarmTime, dow_mask: u8, now: &DateTime, match_now: bool) -> Option<u16> {
    if dow_mask & 0x7F == 0 {
        return None;
    }

    let today = now.day_of_week.index();
    let mut dow = today;
    let mut day_offset: i32 = 0;

    while day_offset < 7 {
        if dow > 6 {
            dow = 0;
        }

        if dow_mask & (1 << dow) != 0 {
            if dow != today {
                break;
            }
            if match_now && time.hour == now.hour && time.minute == now.minute {
                break;
            }
            if time.hour > now.hour || (time.hour == now.hour && time.minute > now.minute) {
                break;
            }
        }

        dow += 1;
        day_offset += 1;
    }

    // Only today is flagged and its time has passed: fire a week from now.
    let offset = day_offset * 1440
        + (i32::from(time.hour) - i32::from(now.hour)) * 60
        + (i32::from(time.minute) - i32::from(now.minute));

    u16::try_from(offset).ok()
}
