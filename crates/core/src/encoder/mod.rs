use std::{fmt, ops::Index};

use serde::{Deserialize, Serialize};

use crate::{FlickerError, Result};

/// Number of optical bars a state code drives: one clock bar and four data
/// bars.
pub const BAR_COUNT: usize = 5;

/// Synchronisation pattern sent ahead of every pass over the payload. The
/// reader uses it to settle its gain and lock onto the clock.
pub const PREAMBLE: [StateCode; 6] = [
    StateCode(0b00001),
    StateCode(0b00000),
    StateCode(0b11111),
    StateCode(0b11110),
    StateCode(0b11111),
    StateCode(0b11110),
];

/// A single discrete display state.
///
/// Bit 0 is the clock bar, bits 1 to 4 carry one hex digit. The mapping to
/// actual light output belongs to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateCode(u8);

impl StateCode {
    /// Clock phase A of the digit: data bits with the clock bar lit.
    pub fn clock_high(digit: u8) -> Self {
        Self(((digit & 0x0f) << 1) | 1)
    }

    /// Clock phase B of the digit: data bits with the clock bar dark.
    pub fn clock_low(digit: u8) -> Self {
        Self((digit & 0x0f) << 1)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn clock(self) -> bool {
        self.0 & 1 == 1
    }

    /// The four data bits carried by this state.
    pub fn data(self) -> u8 {
        self.0 >> 1
    }

    /// Whether the bar at `index` is lit. Out of range bars are always dark.
    pub fn bar(self, index: usize) -> bool {
        index < BAR_COUNT && (self.0 >> index) & 1 == 1
    }

    pub fn bars(self) -> [bool; BAR_COUNT] {
        std::array::from_fn(|index| self.bar(index))
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<StateCode> for u8 {
    fn from(value: StateCode) -> Self {
        value.0
    }
}

/// Cyclic sequence of state codes derived from one hex payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EncodedStream {
    codes: Vec<StateCode>,
}

impl EncodedStream {
    /// Number of states in one pass, preamble included. Never zero.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<StateCode> {
        self.codes.get(index).copied()
    }

    pub fn as_slice(&self) -> &[StateCode] {
        &self.codes
    }

    pub fn iter(&self) -> impl Iterator<Item = StateCode> + '_ {
        self.codes.iter().copied()
    }

    /// The states following the preamble.
    pub fn payload(&self) -> &[StateCode] {
        &self.codes[PREAMBLE.len()..]
    }

    /// Index of the state that follows `index` in the cycle.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.codes.len()
    }
}

impl Index<usize> for EncodedStream {
    type Output = StateCode;

    fn index(&self, index: usize) -> &Self::Output {
        &self.codes[index]
    }
}

impl<'a> IntoIterator for &'a EncodedStream {
    type Item = &'a StateCode;
    type IntoIter = std::slice::Iter<'a, StateCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.codes.iter()
    }
}

/// Encodes a hex challenge into its flicker stream.
///
/// Adjacent digits are transmitted in swapped order (`hex[i ^ 1]`), each as a
/// clock-high/clock-low pair. The whole payload is validated before anything
/// is emitted.
pub fn encode(hex: &str) -> Result<EncodedStream> {
    let digits = parse_digits(hex)?;

    let mut codes = Vec::with_capacity(PREAMBLE.len() + 2 * digits.len());
    codes.extend_from_slice(&PREAMBLE);
    for position in 0..digits.len() {
        let digit = digits[position ^ 1];
        codes.push(StateCode::clock_high(digit));
        codes.push(StateCode::clock_low(digit));
    }

    Ok(EncodedStream { codes })
}

fn parse_digits(hex: &str) -> Result<Vec<u8>> {
    let digits = hex
        .chars()
        .enumerate()
        .map(|(position, character)| {
            character
                .to_digit(16)
                .map(|digit| digit as u8)
                .ok_or(FlickerError::InvalidPayload {
                    position,
                    character,
                })
        })
        .collect::<Result<Vec<u8>>>()?;

    if digits.len() % 2 != 0 {
        return Err(FlickerError::OddLengthPayload { len: digits.len() });
    }
    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(stream: &EncodedStream) -> Vec<u8> {
        stream.iter().map(StateCode::value).collect()
    }

    #[test]
    fn empty_payload_is_only_the_preamble() {
        let stream = encode("").unwrap();
        assert_eq!(values(&stream), vec![1, 0, 31, 30, 31, 30]);
        assert!(stream.payload().is_empty());
    }

    #[test]
    fn length_is_preamble_plus_two_per_digit() {
        for hex in ["", "00", "0f1e", "0123456789abcdef", "deadbeefcafe"] {
            let stream = encode(hex).unwrap();
            assert_eq!(stream.len(), 6 + 2 * hex.len(), "payload {hex}");
        }
    }

    #[test]
    fn digits_are_read_pairwise_swapped() {
        let hex = "1a2b";
        let stream = encode(hex).unwrap();
        let chars: Vec<char> = hex.chars().collect();

        for i in 0..chars.len() {
            let d = chars[i ^ 1].to_digit(16).unwrap() as u8;
            assert_eq!(stream[6 + 2 * i].value(), (d << 1) | 1);
            assert_eq!(stream[6 + 2 * i + 1].value(), d << 1);
        }
        assert_eq!(values(&stream)[6..], [21, 20, 3, 2, 23, 22, 5, 4]);
    }

    #[test]
    fn uppercase_digits_are_accepted() {
        assert_eq!(encode("AF").unwrap(), encode("af").unwrap());
    }

    #[test]
    fn non_hex_character_is_rejected() {
        let err = encode("g").unwrap_err();
        assert!(matches!(
            err,
            FlickerError::InvalidPayload {
                position: 0,
                character: 'g'
            }
        ));

        let err = encode("01x3").unwrap_err();
        assert!(matches!(err, FlickerError::InvalidPayload { position: 2, .. }));
        assert!(err.is_invalid_payload());
    }

    #[test]
    fn odd_length_payload_is_rejected() {
        let err = encode("abc").unwrap_err();
        assert!(matches!(err, FlickerError::OddLengthPayload { len: 3 }));
        assert!(err.is_invalid_payload());
    }

    #[test]
    fn swapping_a_pair_only_touches_that_pair() {
        let original = encode("12345678").unwrap();
        let swapped = encode("12435678").unwrap();

        let changed: Vec<usize> = (0..original.len())
            .filter(|&i| original[i] != swapped[i])
            .collect();
        assert_eq!(changed, vec![10, 11, 12, 13]);
    }

    #[test]
    fn state_code_exposes_bars() {
        let code = StateCode::clock_high(0b1010);
        assert!(code.clock());
        assert_eq!(code.data(), 0b1010);
        assert_eq!(code.bars(), [true, false, true, false, true]);
        assert!(!code.bar(BAR_COUNT));
    }

    #[test]
    fn next_index_wraps() {
        let stream = encode("00").unwrap();
        assert_eq!(stream.next_index(0), 1);
        assert_eq!(stream.next_index(stream.len() - 1), 0);
    }
}
