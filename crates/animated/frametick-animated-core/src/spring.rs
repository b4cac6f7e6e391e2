//! Damped spring integrator in tension/friction form.
//!
//! Time is consumed in fixed 1 ms RK4 steps; a long frame gap is clamped to 64 ms so
//! that a stalled frame cannot make the integration explode. Whatever is left in the
//! accumulator after the last whole step is blended between the previous and the
//! current state.

use crate::types::SpringConfig;

const SOLVER_TIMESTEP_SEC: f64 = 0.001;
const MAX_DELTA_TIME_SEC: f64 = 0.064;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct PhysicsState {
    position: f64,
    velocity: f64,
}

#[derive(Clone, Debug)]
pub struct Spring {
    tension: f64,
    friction: f64,
    overshoot_clamping: bool,
    rest_displacement_threshold: f64,
    rest_speed_threshold: f64,
    start_value: f64,
    end_value: f64,
    current: PhysicsState,
    previous: PhysicsState,
    time_accumulator: f64,
    was_at_rest: bool,
}

impl Spring {
    pub fn new(config: &SpringConfig) -> Self {
        Self {
            tension: config.tension,
            friction: config.friction,
            overshoot_clamping: config.overshoot_clamping,
            rest_displacement_threshold: config.rest_displacement_threshold,
            rest_speed_threshold: config.rest_speed_threshold,
            start_value: 0.0,
            end_value: config.to_value,
            current: PhysicsState {
                position: 0.0,
                velocity: config.initial_velocity,
            },
            previous: PhysicsState::default(),
            time_accumulator: 0.0,
            was_at_rest: false,
        }
    }

    /// Move the spring to `value` without touching its velocity or end value.
    pub fn set_current_value(&mut self, value: f64) {
        self.start_value = value;
        self.current.position = value;
        self.previous = self.current;
        self.was_at_rest = false;
    }

    pub fn value(&self) -> f64 {
        self.current.position
    }

    pub fn velocity(&self) -> f64 {
        self.current.velocity
    }

    pub fn end_value(&self) -> f64 {
        self.end_value
    }

    pub fn is_at_rest(&self) -> bool {
        self.current.velocity.abs() <= self.rest_speed_threshold
            && ((self.end_value - self.current.position).abs() <= self.rest_displacement_threshold
                || self.tension == 0.0)
    }

    pub fn is_overshooting(&self) -> bool {
        self.tension > 0.0
            && ((self.start_value < self.end_value && self.current.position > self.end_value)
                || (self.start_value > self.end_value && self.current.position < self.end_value))
    }

    fn acceleration(&self, position: f64, velocity: f64) -> f64 {
        self.tension * (self.end_value - position) - self.friction * velocity
    }

    fn rk4_step(&self, position: f64, velocity: f64) -> (f64, f64) {
        let h = SOLVER_TIMESTEP_SEC;

        let a_vel = velocity;
        let a_acc = self.acceleration(position, velocity);

        let b_vel = velocity + a_acc * h * 0.5;
        let b_acc = self.acceleration(position + a_vel * h * 0.5, b_vel);

        let c_vel = velocity + b_acc * h * 0.5;
        let c_acc = self.acceleration(position + b_vel * h * 0.5, c_vel);

        let d_vel = velocity + c_acc * h;
        let d_acc = self.acceleration(position + c_vel * h, d_vel);

        let dxdt = (a_vel + 2.0 * (b_vel + c_vel) + d_vel) / 6.0;
        let dvdt = (a_acc + 2.0 * (b_acc + c_acc) + d_acc) / 6.0;
        (position + dxdt * h, velocity + dvdt * h)
    }

    /// Advance by `real_delta_sec` seconds. A spring that was already at rest on the
    /// previous advance does nothing.
    pub fn advance(&mut self, real_delta_sec: f64) {
        let mut at_rest = self.is_at_rest();
        if at_rest && self.was_at_rest {
            return;
        }

        self.time_accumulator += real_delta_sec.clamp(0.0, MAX_DELTA_TIME_SEC);

        let (mut position, mut velocity) = (self.current.position, self.current.velocity);
        while self.time_accumulator >= SOLVER_TIMESTEP_SEC {
            self.time_accumulator -= SOLVER_TIMESTEP_SEC;
            if self.time_accumulator < SOLVER_TIMESTEP_SEC {
                self.previous = PhysicsState { position, velocity };
            }
            (position, velocity) = self.rk4_step(position, velocity);
        }
        self.current = PhysicsState { position, velocity };

        if self.time_accumulator > 0.0 {
            self.interpolate(self.time_accumulator / SOLVER_TIMESTEP_SEC);
        }

        if self.is_at_rest() || (self.overshoot_clamping && self.is_overshooting()) {
            if self.tension > 0.0 {
                self.start_value = self.end_value;
                self.current.position = self.end_value;
            } else {
                self.end_value = self.current.position;
                self.start_value = self.end_value;
            }
            self.current.velocity = 0.0;
            at_rest = true;
        }
        self.was_at_rest = at_rest;
    }

    fn interpolate(&mut self, alpha: f64) {
        self.current.position =
            self.current.position * alpha + self.previous.position * (1.0 - alpha);
        self.current.velocity =
            self.current.velocity * alpha + self.previous.velocity * (1.0 - alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tension: f64, friction: f64, clamp: bool) -> SpringConfig {
        SpringConfig {
            overshoot_clamping: clamp,
            rest_displacement_threshold: 0.001,
            rest_speed_threshold: 0.001,
            tension,
            friction,
            initial_velocity: 0.0,
            to_value: 1.0,
        }
    }

    fn run(spring: &mut Spring, frames: usize, dt: f64) -> Vec<f64> {
        (0..frames)
            .map(|_| {
                spring.advance(dt);
                spring.value()
            })
            .collect()
    }

    #[test]
    fn critically_damped_spring_settles_without_overshoot() {
        let mut spring = Spring::new(&config(100.0, 20.0, false));
        let trace = run(&mut spring, 240, 0.016);
        assert!(trace.iter().all(|v| *v <= 1.0 + 1e-9), "no overshoot");
        assert!(trace.windows(2).all(|w| w[1] >= w[0]), "monotone approach");
        assert!(spring.is_at_rest());
        assert_eq!(spring.value(), 1.0);
        assert_eq!(spring.velocity(), 0.0);
    }

    #[test]
    fn underdamped_spring_overshoots_unless_clamped() {
        let mut loose = Spring::new(&config(230.2, 10.0, false));
        let peak = run(&mut loose, 60, 0.016)
            .into_iter()
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.05, "peak {peak}");

        let mut clamped = Spring::new(&config(230.2, 10.0, true));
        let trace = run(&mut clamped, 60, 0.016);
        assert!(trace.iter().all(|v| *v <= 1.0));
        assert!(clamped.is_at_rest());
    }

    #[test]
    fn zero_delta_does_not_move() {
        let mut spring = Spring::new(&config(100.0, 20.0, false));
        spring.set_current_value(0.25);
        spring.advance(0.0);
        assert_eq!(spring.value(), 0.25);
    }

    #[test]
    fn long_gap_is_clamped() {
        let mut stalled = Spring::new(&config(100.0, 20.0, false));
        stalled.advance(5.0);
        let mut capped = Spring::new(&config(100.0, 20.0, false));
        capped.advance(MAX_DELTA_TIME_SEC);
        assert!((stalled.value() - capped.value()).abs() < 1e-12);
        assert!(stalled.value() < 1.0);
    }

    #[test]
    fn zero_tension_rests_where_it_stops() {
        let mut spring = Spring::new(&SpringConfig {
            initial_velocity: 2.0,
            ..config(0.0, 10.0, false)
        });
        run(&mut spring, 200, 0.016);
        assert!(spring.is_at_rest());
        assert_eq!(spring.end_value(), spring.value());
        assert!(spring.value() > 0.0 && spring.value() < 1.0);
    }
}
