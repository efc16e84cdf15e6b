//! Cyclic group of prime order, used by the oblivious-transfer subprotocol.
//!
//! Arithmetic is done over [`num_bigint::BigUint`]; the teacher crate has no
//! big-integer dependency of its own, so `num-bigint`/`num-traits` are
//! supplemented from `LHY-in-universe-MPC_API`, which already depends on
//! them for its own group arithmetic. Randomness is drawn through
//! `rand::RngCore::fill_bytes` directly rather than through num-bigint's
//! optional `rand` feature, which pins an older major version of `rand`
//! than the rest of this workspace uses.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::RngCore;

const MILLER_RABIN_ROUNDS: u32 = 20;

/// A cyclic group of prime order `prime`, with a chosen generator.
#[derive(Debug, Clone)]
pub struct PrimeGroup {
    prime: BigUint,
    prime_minus_one: BigUint,
    prime_minus_two: BigUint,
    generator: BigUint,
}

impl PrimeGroup {
    /// Generate a fresh prime group with a prime of the given bit length.
    ///
    /// Mirrors `util.PrimeGroup.__init__` in `original_source`: draw a
    /// random prime, then search for a generator of the multiplicative
    /// group mod `prime`.
    pub fn generate<R: RngCore>(bits: u32, rng: &mut R) -> Self {
        let prime = gen_prime(bits, rng);
        Self::with_prime(prime, rng)
    }

    /// Build a group from an already-known prime (used when deserializing
    /// an `OT_Setup` message on the chooser side).
    pub fn with_prime<R: RngCore>(prime: BigUint, rng: &mut R) -> Self {
        let prime_minus_one = &prime - BigUint::one();
        let prime_minus_two = &prime - 2u32;
        let generator = find_generator(&prime, &prime_minus_one, rng);
        PrimeGroup {
            prime,
            prime_minus_one,
            prime_minus_two,
            generator,
        }
    }

    /// Build a group from an already-known `(prime, generator)` pair,
    /// without a generator search. Used by the oblivious-transfer chooser,
    /// which must agree with the sender's published generator rather than
    /// pick its own.
    pub fn from_parts(prime: BigUint, generator: BigUint) -> Self {
        let prime_minus_one = &prime - BigUint::one();
        let prime_minus_two = &prime - 2u32;
        PrimeGroup {
            prime,
            prime_minus_one,
            prime_minus_two,
            generator,
        }
    }

    /// The group's prime modulus.
    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    /// The chosen generator.
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// Multiply two group elements.
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.prime
    }

    /// Raise `base` to `exponent`, modulo the group's prime.
    pub fn pow(&self, base: &BigUint, exponent: &BigUint) -> BigUint {
        base.modpow(exponent, &self.prime)
    }

    /// Multiplicative inverse of `x`, via Fermat's little theorem
    /// (`x^(p-2) mod p`).
    pub fn inv(&self, x: &BigUint) -> BigUint {
        x.modpow(&self.prime_minus_two, &self.prime)
    }

    /// Raise the generator to `exponent`.
    pub fn gen_pow(&self, exponent: &BigUint) -> BigUint {
        self.generator.modpow(exponent, &self.prime)
    }

    /// Uniform random element of `[1, prime - 1]`.
    pub fn rand_elt<R: RngCore>(&self, rng: &mut R) -> BigUint {
        rand_range_inclusive(rng, &BigUint::one(), &self.prime_minus_one)
    }

    /// `true` if `x` is a valid group element, i.e. in `[1, prime - 1]`.
    pub fn contains(&self, x: &BigUint) -> bool {
        !x.is_zero() && x < &self.prime
    }
}

/// Uniform random integer in `[0, bound)`, by rejection sampling over the
/// minimal number of random bytes that cover `bound`'s bit length.
fn random_below<R: RngCore>(rng: &mut R, bound: &BigUint) -> BigUint {
    if bound.is_zero() {
        return BigUint::zero();
    }
    let bits = bound.bits() as usize;
    let nbytes = bits.div_ceil(8).max(1);
    loop {
        let mut buf = vec![0u8; nbytes];
        rng.fill_bytes(&mut buf);
        let extra = nbytes * 8 - bits;
        if extra > 0 {
            buf[0] &= 0xFFu8 >> extra;
        }
        let candidate = BigUint::from_bytes_be(&buf);
        if &candidate < bound {
            return candidate;
        }
    }
}

/// Draw a uniform random `BigUint` in `[lo, hi]` inclusive.
fn rand_range_inclusive<R: RngCore>(rng: &mut R, lo: &BigUint, hi: &BigUint) -> BigUint {
    let span = hi - lo + BigUint::one();
    lo + random_below(rng, &span)
}

/// Generate a random prime with exactly `bits` bits using rejection sampling
/// over odd candidates and a Miller-Rabin primality test.
fn gen_prime<R: RngCore>(bits: u32, rng: &mut R) -> BigUint {
    assert!(bits >= 2, "prime must be at least 2 bits");
    let nbytes = (bits as usize).div_ceil(8);
    let extra = nbytes * 8 - bits as usize;
    loop {
        let mut buf = vec![0u8; nbytes];
        rng.fill_bytes(&mut buf);
        if extra > 0 {
            buf[0] &= 0xFFu8 >> extra;
        }
        buf[0] |= 1 << (7 - extra); // fix the bit length
        buf[nbytes - 1] |= 1; // odd
        let candidate = BigUint::from_bytes_be(&buf);
        if is_probably_prime(&candidate, rng) {
            return candidate;
        }
    }
}

/// Miller-Rabin primality test.
fn is_probably_prime<R: RngCore>(n: &BigUint, rng: &mut R) -> bool {
    let small_primes: [u32; 8] = [2, 3, 5, 7, 11, 13, 17, 19];
    if *n < BigUint::from(2u32) {
        return false;
    }
    for &p in &small_primes {
        let p = BigUint::from(p);
        if *n == p {
            return true;
        }
        if (n % &p).is_zero() {
            return false;
        }
    }

    let one = BigUint::one();
    let n_minus_one = n - &one;
    let (mut d, mut r) = (n_minus_one.clone(), 0u32);
    while (&d & &one).is_zero() {
        d >>= 1u32;
        r += 1;
    }

    'witness: for _ in 0..MILLER_RABIN_ROUNDS {
        let a = rand_range_inclusive(rng, &BigUint::from(2u32), &(n - 2u32));
        let mut x = a.modpow(&d, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 0..r.saturating_sub(1) {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// Factor `p - 1` by trial division. Practical only for the small prime
/// sizes used in the test suite (the spec explicitly flags 2048+ bit
/// primes as the recommendation for deployed use, at which point factoring
/// `p - 1` this way would not terminate in reasonable time).
fn prime_factors(mut n: BigUint) -> Vec<BigUint> {
    let mut factors = Vec::new();
    let two = BigUint::from(2u32);
    while n.is_even() {
        if factors.last() != Some(&two) {
            factors.push(two.clone());
        }
        n /= &two;
    }
    let mut f = BigUint::from(3u32);
    while &f * &f <= n {
        while (&n % &f).is_zero() {
            if factors.last() != Some(&f) {
                factors.push(f.clone());
            }
            n /= &f;
        }
        f += 2u32;
    }
    if n > BigUint::one() {
        factors.push(n);
    }
    factors
}

/// Find a uniform random generator of the multiplicative group mod `prime`,
/// by resampling until every prime factor `q` of `prime - 1` satisfies
/// `candidate^((prime-1)/q) != 1`.
fn find_generator<R: RngCore>(prime: &BigUint, prime_minus_one: &BigUint, rng: &mut R) -> BigUint {
    let factors = prime_factors(prime_minus_one.clone());
    loop {
        let candidate = rand_range_inclusive(rng, &BigUint::one(), prime_minus_one);
        if factors
            .iter()
            .all(|q| candidate.modpow(&(prime_minus_one / q), prime) != BigUint::one())
        {
            return candidate;
        }
    }
}
