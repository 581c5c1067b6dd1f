// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2023 Robert Hrusecky <jadedpastabowl@gmail.com>

use crate::tick::TickCounter;

pub trait TimerBus {
    fn request_timer_interrupt(&mut self);
}

const ENABLE: u8 = 0x4;
const DIV_PERIOD: usize = 256;

/// T-cycles per TIMA increment for each TAC clock select value.
const fn tima_period(tac: u8) -> usize {
    match tac & 0x3 {
        0b00 => 1024,
        0b01 => 16,
        0b10 => 64,
        _ => 256,
    }
}

pub struct Timer {
    div: u8,
    tima: u8,
    tma: u8,
    tac: u8,
    div_ticks: TickCounter,
    tima_ticks: TickCounter,
}

impl Timer {
    pub fn new() -> Self {
        Timer {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            div_ticks: TickCounter::new(DIV_PERIOD),
            tima_ticks: TickCounter::new(tima_period(0)),
        }
    }

    pub fn execute(&mut self, ticks: usize, bus: &mut impl TimerBus) {
        let div = &mut self.div;
        self.div_ticks.for_each_edge(ticks, || *div = div.wrapping_add(1));

        if self.tac & ENABLE == 0 {
            return;
        }

        let Self { tima, tma, tima_ticks, .. } = self;
        tima_ticks.for_each_edge(ticks, || {
            let (next, overflow) = tima.overflowing_add(1);
            *tima = if overflow {
                bus.request_timer_interrupt();
                *tma
            } else {
                next
            };
        });
    }

    pub fn div(&self) -> u8 {
        self.div
    }

    pub fn reset_div(&mut self) {
        self.div = 0;
        self.div_ticks.reset();
        self.tima_ticks.reset();
    }

    pub fn tima(&self) -> u8 {
        self.tima
    }

    pub fn set_tima(&mut self, tima: u8) {
        self.tima = tima;
    }

    pub fn tma(&self) -> u8 {
        self.tma
    }

    pub fn set_tma(&mut self, tma: u8) {
        self.tma = tma;
    }

    pub fn tac(&self) -> u8 {
        // Unused bits read high
        self.tac | 0xf8
    }

    pub fn set_tac(&mut self, tac: u8) {
        self.tac = tac & 0x7;
        self.tima_ticks.rearm(tima_period(tac));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct InterruptModerator<F> {
        func: F,
    }

    impl<F> TimerBus for InterruptModerator<F>
    where
        F: FnMut(),
    {
        fn request_timer_interrupt(&mut self) {
            (self.func)();
        }
    }

    fn tma_ff(tac: u8, period: usize) {
        let mut timer = Timer::new();
        timer.set_tma(0xff);
        timer.set_tima(0xff);
        timer.set_tac(tac | ENABLE);

        let mut requests = 0;
        // Step one M-cycle at a time
        for i in 0..10 * period / 4 {
            let mut bus = InterruptModerator {
                func: || {
                    requests += 1;
                    assert!((i + 1) * 4 % period == 0, "Requested interrupt when not expected");
                },
            };
            timer.execute(4, &mut bus);
        }
        assert_eq!(requests, 10, "Did not request correct amount of interrupts");
    }

    #[test]
    fn tma_ff_00() {
        tma_ff(0b00, 1 << 10);
    }

    #[test]
    fn tma_ff_01() {
        tma_ff(0b01, 1 << 4);
    }

    #[test]
    fn tma_ff_10() {
        tma_ff(0b10, 1 << 6);
    }

    #[test]
    fn tma_ff_11() {
        tma_ff(0b11, 1 << 8);
    }

    #[test]
    fn overflow_reloads_tma() {
        let mut timer = Timer::new();
        timer.set_tac(0x05);
        timer.set_tma(0xab);
        timer.set_tima(0xfe);

        let mut requests = 0;
        let mut bus = InterruptModerator { func: || requests += 1 };
        timer.execute(32, &mut bus);
        assert_eq!(timer.tima(), 0xab);
        assert_eq!(requests, 1);
    }

    #[test]
    fn increments_match_elapsed_time() {
        for tac in 0..4 {
            let period = tima_period(tac);
            let mut timer = Timer::new();
            timer.set_tac(tac | ENABLE);
            let mut bus = InterruptModerator { func: || () };

            let mut elapsed = 0;
            let mut increments = 0usize;
            for step in [4, 8, 12, 16, 20, 24].iter().cycle().take(400) {
                let before = timer.tima();
                timer.execute(*step, &mut bus);
                increments += timer.tima().wrapping_sub(before) as usize;
                elapsed += step;
                assert_eq!(increments, elapsed / period, "tac {tac:#04b}");
            }
        }
    }

    #[test]
    fn disabled_timer_only_counts_div() {
        let mut timer = Timer::new();
        timer.set_tac(0x01);
        let mut bus = InterruptModerator { func: || panic!("timer is disabled") };
        timer.execute(DIV_PERIOD * 3, &mut bus);
        assert_eq!(timer.tima(), 0);
        assert_eq!(timer.div(), 3);
    }

    #[test]
    fn div_write_resets_accumulators() {
        let mut timer = Timer::new();
        timer.set_tac(0x05);
        let mut bus = InterruptModerator { func: || () };
        timer.execute(255, &mut bus);
        assert_eq!(timer.div(), 0);
        assert_eq!(timer.tima(), 15);

        timer.reset_div();
        timer.execute(15, &mut bus);
        assert_eq!(timer.tima(), 15, "TIMA accumulator should restart from zero");
        timer.execute(241, &mut bus);
        assert_eq!(timer.div(), 1);
        assert_eq!(timer.tima(), 31);
    }

    #[test]
    fn tac_reads_upper_bits_high() {
        let mut timer = Timer::new();
        timer.set_tac(0xfd);
        assert_eq!(timer.tac(), 0xfd);
        timer.set_tac(0x02);
        assert_eq!(timer.tac(), 0xfa);
    }
}
