use std::fmt;

/// Largest amount a single record may carry: 999 999 999 999.99.
pub const MAX_AMOUNT: i64 = 99_999_999_999_999;

/// Non-negative quantity of cents carried by one record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const MAX: Amount = Amount(MAX_AMOUNT);

    pub fn zero() -> Self {
        Amount(0)
    }

    /// `None` unless `0 <= cents <= MAX_AMOUNT`.
    pub fn from_cents(cents: i64) -> Option<Self> {
        (0..=MAX_AMOUNT).contains(&cents).then_some(Amount(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Signed sum of cents: running totals, aggregate sums and balances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(pub i64);

impl Cents {
    pub fn zero() -> Self {
        Cents(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, amount: Amount) -> Option<Cents> {
        self.0.checked_add(amount.0).map(Cents)
    }

    pub fn checked_sub(self, amount: Amount) -> Option<Cents> {
        self.0.checked_sub(amount.0).map(Cents)
    }

    /// Room left below `i64::MAX`.
    pub fn headroom(&self) -> i64 {
        i64::MAX - self.0
    }
}

impl From<Amount> for Cents {
    fn from(amount: Amount) -> Cents {
        Cents(amount.0)
    }
}

impl std::ops::Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Self::Output {
        Cents(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign<Amount> for Cents {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Cents) -> Self::Output {
        self + -rhs
    }
}

impl std::ops::Neg for Cents {
    type Output = Cents;

    fn neg(self) -> Self::Output {
        Cents(-self.0)
    }
}

// The sign always sits on the whole part, cents are shown unsigned, so
// -50 cents renders as `-0.50` rather than `0.-50` or `0.50`.
impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}
