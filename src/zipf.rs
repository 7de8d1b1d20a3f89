/// Zipfian integer distribution with O(1) sampling, after the
/// Gray-Menasce-Blakeley method from "Quickly Generating Billion-Record
/// Synthetic Databases" (SIGMOD 1994).
///
/// The zeta normalizer is computed once at construction; sampling is a
/// single uniform draw plus an inverse-CDF approximation.
use rand::Rng;

#[derive(Clone, Copy, Debug)]
pub struct ZipfianInt {
    min: u64,
    max: u64,
    theta: f64,
    zeta: f64,
    alpha: f64,
    eta: f64,
}

impl ZipfianInt {
    pub fn new(min: u64, max: u64, theta: f64) -> Self {
        let n = max - min + 1;
        let mut zeta = 0.0;
        for i in 1..=n {
            zeta += fast_precise_pow(1.0 / i as f64, theta);
        }
        // zeta(2, theta) = 1 + 1/2^theta
        let zeta2theta = 1.0 + fast_precise_pow(0.5, theta);
        let alpha = 1.0 / (1.0 - theta);
        let eta = (1.0 - fast_precise_pow(2.0 / n as f64, 1.0 - theta)) / (1.0 - zeta2theta / zeta);
        ZipfianInt {
            min,
            max,
            theta,
            zeta,
            alpha,
            eta,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let u: f64 = rng.random();
        let uz = u * self.zeta;

        if uz < 1.0 {
            return self.min;
        }
        if uz < 1.0 + fast_precise_pow(0.5, self.theta) {
            return self.min + 1;
        }

        let n = (self.max - self.min + 1) as f64;
        let result =
            self.min as f64 + n * fast_precise_pow(self.eta * u - self.eta + 1.0, self.alpha);
        (result as u64).min(self.max)
    }
}

/// Fast approximate power function. Splits the exponent into an integer
/// part, handled by squaring, and a fractional part approximated by
/// linear interpolation on the high 32 bits of the IEEE 754 encoding.
/// The magic constant 1072632447 is the biased exponent of 1.0 shifted
/// into the high word.
pub fn fast_precise_pow(a: f64, b: f64) -> f64 {
    let e = b as i32;

    let bits = a.to_bits();
    let high = (bits >> 32) as i32;
    let new_high = ((b - e as f64) * (high - 1072632447) as f64 + 1072632447.0) as i32;
    let frac_result = f64::from_bits((new_high as u64) << 32);

    let mut base = a;
    let mut exp = e;
    let mut r = 1.0;
    while exp != 0 {
        if exp & 1 != 0 {
            r *= base;
        }
        base *= base;
        exp >>= 1;
    }

    r * frac_result
}
