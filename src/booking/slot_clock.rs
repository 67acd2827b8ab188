//! 슬롯 시계
//!
//! 주어진 현재 시각과 대상 날짜로부터 제공 가능한 1시간 단위 슬롯을 계산합니다.
//! 순수 함수이며 벽시계를 직접 읽지 않습니다. 호출자가 `now` 를 넘깁니다.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

/// 운영 시간대 (시작/종료 시각 모두 포함)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotClock {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl Default for SlotClock {
    fn default() -> Self {
        Self {
            open_hour: 6,
            close_hour: 22,
        }
    }
}

impl SlotClock {
    pub fn new(open_hour: u32, close_hour: u32) -> Self {
        debug_assert!(open_hour <= close_hour && close_hour <= 23);
        Self {
            open_hour,
            close_hour,
        }
    }

    /// 하루에 존재하는 후보 슬롯 수
    pub fn slots_per_day(&self) -> usize {
        (self.close_hour - self.open_hour + 1) as usize
    }

    pub fn in_window(&self, hour: u32) -> bool {
        hour >= self.open_hour && hour <= self.close_hour
    }

    /// 제공 가능한 시작 시각 목록 (오름차순)
    ///
    /// - 미래 날짜: 운영 시간대 전체
    /// - 오늘: 현재 시각보다 엄격히 늦은 슬롯만 (현재 시각에 시작하는 슬롯은 이미 시작된 것으로 간주)
    /// - 지난 날짜: 빈 목록
    pub fn available_hours(&self, date: NaiveDate, now: NaiveDateTime) -> Vec<u32> {
        let today = now.date();
        let window = self.open_hour..=self.close_hour;

        if date > today {
            window.collect()
        } else if date == today {
            let current_hour = now.hour();
            window.filter(|hour| *hour > current_hour).collect()
        } else {
            Vec::new()
        }
    }

    pub fn is_offerable(&self, date: NaiveDate, hour: u32, now: NaiveDateTime) -> bool {
        if !self.in_window(hour) {
            return false;
        }
        let today = now.date();
        date > today || (date == today && hour > now.hour())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, minute, 0).unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn test_future_date_returns_whole_window() {
        let clock = SlotClock::default();
        let hours = clock.available_hours(day(17), at(day(16), 14, 30));

        assert_eq!(hours.len(), clock.slots_per_day());
        assert_eq!(hours.len(), 17);
        assert_eq!(hours.first(), Some(&6));
        assert_eq!(hours.last(), Some(&22));
        assert!(hours.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_today_excludes_current_and_past_hours() {
        let clock = SlotClock::default();
        let hours = clock.available_hours(day(16), at(day(16), 14, 0));

        assert_eq!(hours.first(), Some(&15));
        assert!(hours.iter().all(|h| *h > 14));
        assert_eq!(hours.len(), 8);
    }

    #[test]
    fn test_today_late_evening_is_empty() {
        let clock = SlotClock::default();
        assert!(clock.available_hours(day(16), at(day(16), 22, 5)).is_empty());
        assert!(clock.available_hours(day(16), at(day(16), 23, 59)).is_empty());
    }

    #[test]
    fn test_early_morning_today_offers_full_window() {
        let clock = SlotClock::default();
        for hour in 0..6 {
            let hours = clock.available_hours(day(16), at(day(16), hour, 10));
            assert_eq!(hours.len(), 17, "hour {}", hour);
        }
    }

    #[test]
    fn test_past_date_is_always_empty() {
        let clock = SlotClock::default();
        // 자정 직후와 새벽에도 어제는 제공하지 않음
        for hour in [0, 1, 5, 6, 12, 23] {
            assert!(clock.available_hours(day(15), at(day(16), hour, 0)).is_empty());
        }
        assert!(clock.available_hours(day(1), at(day(16), 12, 0)).is_empty());
    }

    #[test]
    fn test_is_offerable_matches_available_hours() {
        let clock = SlotClock::new(8, 20);
        let now = at(day(16), 9, 45);

        for date in [day(15), day(16), day(17)] {
            let hours = clock.available_hours(date, now);
            for hour in 0..24 {
                assert_eq!(clock.is_offerable(date, hour, now), hours.contains(&hour));
            }
        }
        assert!(!clock.is_offerable(day(17), 21, now));
        assert!(!clock.is_offerable(day(17), 7, now));
    }
}
