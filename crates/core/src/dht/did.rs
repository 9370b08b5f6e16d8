#![warn(missing_docs)]

//! Identifiers on the ring.
//!
//! A [Did] is a position on the finite ring Z/(2^160), wrapping an [H160]. Node identifiers
//! and key identifiers live in the same space: both are SHA-1 digests (see [hash_of]).
//!
//! Two kinds of order are used:
//! * the raw numeric order ([Ord] on the big-endian value), used for equality and tie-breaking;
//! * the clockwise order seen from some origin `a`, where `x` precedes `y` if the ring distance
//!   `x - a` is smaller than `y - a`. Every interval predicate below is defined through this
//!   distance, so wraparound past zero needs no special case.
//!
//! An interval whose bounds are equal spans the whole ring. For the open interval `(a, a)` the
//! bound itself is excluded, for every other flavour it is included.

use std::ops::Add;
use std::ops::Deref;
use std::ops::Neg;
use std::ops::Sub;
use std::str::FromStr;

use ethereum_types::H160;
use num_bigint::BigUint;
use serde::Deserialize;
use serde::Serialize;
use sha1::Digest;
use sha1::Sha1;

use crate::error::Error;
use crate::error::Result;

/// Did is a finite Ring R(P) where P = 2^160, wrap H160.
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd, Debug, Serialize, Deserialize, Hash)]
pub struct Did(H160);

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let inner = &self.0;
        write!(f, "0x{inner:x}")
    }
}

/// Hash an address or a key onto the ring.
pub fn hash_of(s: &str) -> Did {
    let mut hasher = Sha1::new();
    hasher.update(s.as_bytes());
    Did(H160::from_slice(&hasher.finalize()))
}

fn modulus() -> BigUint {
    BigUint::from(2u16).pow(Did::BITS as u32)
}

impl Did {
    /// Width of the identifier space, one bit per finger slot.
    pub const BITS: usize = 160;

    /// Clockwise distance from `self` to `other`.
    pub fn distance(&self, other: Did) -> Did {
        other - *self
    }

    /// Start of finger slot `i`: `self + 2^i mod 2^160`.
    pub fn power2_offset(&self, i: usize) -> Did {
        *self + Did::from(BigUint::from(2u16).pow(i as u32))
    }

    /// The mirror of [Did::power2_offset]: `self - 2^i mod 2^160`.
    pub fn predecessor_offset(&self, i: usize) -> Did {
        *self - Did::from(BigUint::from(2u16).pow(i as u32))
    }

    /// Test self <- (lower, upper)
    pub fn in_open(&self, lower: Did, upper: Did) -> bool {
        if lower == upper {
            return *self != lower;
        }
        let d = lower.distance(*self);
        d > Did::zero() && d < lower.distance(upper)
    }

    /// Test self <- [lower, upper)
    pub fn in_left_closed(&self, lower: Did, upper: Did) -> bool {
        if lower == upper {
            return true;
        }
        lower.distance(*self) < lower.distance(upper)
    }

    /// Test self <- (lower, upper]
    pub fn in_right_closed(&self, lower: Did, upper: Did) -> bool {
        if lower == upper {
            return true;
        }
        let d = lower.distance(*self);
        d > Did::zero() && d <= lower.distance(upper)
    }

    /// Test self <- [lower, upper]
    pub fn in_closed(&self, lower: Did, upper: Did) -> bool {
        if lower == upper {
            return true;
        }
        lower.distance(*self) <= lower.distance(upper)
    }

    /// The additive identity.
    pub fn zero() -> Did {
        Did(H160::zero())
    }
}

/// Ordering with a did reference
/// This trait defines necessary method for sorting based on did.
pub trait SortRing {
    /// Sort clockwise, starting right after `did`.
    fn sort(&mut self, did: Did);
}

impl SortRing for Vec<Did> {
    fn sort(&mut self, did: Did) {
        self.sort_by_key(|x| did.distance(*x));
    }
}

impl Deref for Did {
    type Target = H160;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Did> for H160 {
    fn from(a: Did) -> Self {
        a.0
    }
}

impl From<H160> for Did {
    fn from(addr: H160) -> Self {
        Self(addr)
    }
}

impl From<u32> for Did {
    fn from(id: u32) -> Did {
        Self::from(BigUint::from(id))
    }
}

impl From<Did> for BigUint {
    fn from(did: Did) -> BigUint {
        BigUint::from_bytes_be(did.as_bytes())
    }
}

impl From<BigUint> for Did {
    fn from(a: BigUint) -> Self {
        let ff = a % modulus();
        let va = ff.to_bytes_be();
        let mut res = [0u8; 20];
        res[20 - va.len()..].copy_from_slice(&va);
        Self(H160::from(res))
    }
}

impl FromStr for Did {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(
            H160::from_str(s).map_err(|_| Error::InvalidDid(s.to_string()))?,
        ))
    }
}

// impl Finite Ring For Did
impl Neg for Did {
    type Output = Self;
    fn neg(self) -> Self {
        (modulus() - BigUint::from(self)).into()
    }
}

impl Add for Did {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        (BigUint::from(self) + BigUint::from(rhs)).into()
    }
}

impl Sub for Did {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}
