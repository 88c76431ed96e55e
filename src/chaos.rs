//! Chaotic and recursive number series: Fibonacci, logistic map, Hénon and Lorenz attractors.

// -------------------------------------------------------------------------------------------------

/// Fibonacci terms from index `start` up to, but not including, `end`.
pub fn fibonacci_series(start: usize, end: usize) -> Vec<f64> {
    let sqrt5 = 5f64.sqrt();
    let upper = (1.0 + sqrt5) / 2.0;
    let lower = (1.0 - sqrt5) / 2.0;
    (start..end)
        .map(|i| {
            let n = (i + 1) as i32;
            ((upper.powi(n) - lower.powi(n)) / sqrt5).floor()
        })
        .collect()
}

/// The logistic map (Verhulst equation).
pub fn logistic(p: f64, x: f64) -> f64 {
    p * x * (1.0 - x)
}

// -------------------------------------------------------------------------------------------------

/// Hénon attractor state.
#[derive(Debug, Clone, PartialEq)]
pub struct Henon {
    a: f64,
    b: f64,
    x: f64,
    y: f64,
}

impl Default for Henon {
    fn default() -> Self {
        Self::new(1.4, 0.3, 0.631_354_48, 0.189_406_34)
    }
}

impl Henon {
    pub fn new(a: f64, b: f64, x: f64, y: f64) -> Self {
        Self { a, b, x, y }
    }

    /// Advance one step, optionally with new `a` and `b` coefficients.
    pub fn step(&mut self, a: Option<f64>, b: Option<f64>) -> (f64, f64) {
        if let Some(a) = a {
            self.a = a;
        }
        if let Some(b) = b {
            self.b = b;
        }
        let mut x = 1.0 - self.a * self.x.powi(2) + self.y;
        if !x.is_finite() {
            x = 0.0;
        }
        let y = self.b * self.x;
        self.x = x;
        self.y = y;
        (self.x, self.y)
    }
}

// -------------------------------------------------------------------------------------------------

/// Lorenz attractor state, integrated with a fixed step of 0.01.
#[derive(Debug, Clone, PartialEq)]
pub struct Lorenz {
    r: f64,
    s: f64,
    b: f64,
    x: f64,
    y: f64,
    z: f64,
}

impl Default for Lorenz {
    fn default() -> Self {
        Self::new(28.0, 10.0, 2.666_666_666_6, 1.0, 1.0, 1.0)
    }
}

impl Lorenz {
    const DELTA: f64 = 0.01;

    pub fn new(r: f64, s: f64, b: f64, x: f64, y: f64, z: f64) -> Self {
        Self { r, s, b, x, y, z }
    }

    /// Advance one step.
    pub fn step(&mut self) -> (f64, f64, f64) {
        let dx = self.s * (self.y - self.x);
        let dy = self.r * self.x - self.y - self.x * self.z;
        let dz = self.x * self.y - self.b * self.z;
        self.x += Self::DELTA * dx;
        self.y += Self::DELTA * dy;
        self.z += Self::DELTA * dz;
        (self.x, self.y, self.z)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fibonacci() {
        assert_eq!(
            fibonacci_series(2, 10),
            vec![2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 34.0, 55.0]
        );
        assert_eq!(fibonacci_series(0, 2), vec![1.0, 1.0]);
    }

    #[test]
    fn attractors() {
        assert_eq!(logistic(4.0, 0.5), 1.0);
        let mut henon = Henon::default();
        let mut lorenz = Lorenz::default();
        for _ in 0..500 {
            let (x, y) = henon.step(None, None);
            assert!(x.is_finite() && y.is_finite());
            let (x, y, z) = lorenz.step();
            assert!(x.abs() < 100.0 && y.abs() < 100.0 && z.abs() < 100.0);
        }
    }
}
