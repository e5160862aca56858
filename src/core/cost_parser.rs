//! nom parser for mana cost notation
//!
//! Accepts brace notation (`{2}{R/W}{G}`, `{2/U}`) and the bare shorthand used
//! in older card text (`2RG`). Whitespace between symbols is ignored. A brace
//! holding a single symbol adds to the fixed part; a brace with `/` becomes a
//! choice group.

use crate::core::{Color, ManaCost, ManaSymbols};
use crate::{MtgError, Result};
use nom::{
    branch::alt,
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded, terminated},
    IResult,
};
use smallvec::SmallVec;

enum Piece {
    Fixed(ManaSymbols),
    Choice(SmallVec<[ManaSymbols; 2]>),
}

fn generic(input: &str) -> IResult<&str, ManaSymbols> {
    map_res(digit1, |digits: &str| digits.parse::<u8>().map(ManaSymbols::generic))(input)
}

fn colored(input: &str) -> IResult<&str, ManaSymbols> {
    map(one_of("WUBRGCwubrgc"), |c: char| {
        // one_of restricts input to valid symbols
        let color = Color::from_symbol(c).unwrap_or(Color::Colorless);
        ManaSymbols::of(color, 1)
    })(input)
}

fn symbol(input: &str) -> IResult<&str, ManaSymbols> {
    alt((generic, colored))(input)
}

fn braced(input: &str) -> IResult<&str, Piece> {
    map(
        delimited(char('{'), separated_list1(char('/'), symbol), char('}')),
        |alternatives: Vec<ManaSymbols>| {
            if alternatives.len() == 1 {
                Piece::Fixed(alternatives[0])
            } else {
                Piece::Choice(alternatives.into_iter().collect())
            }
        },
    )(input)
}

fn piece(input: &str) -> IResult<&str, Piece> {
    preceded(multispace0, alt((braced, map(symbol, Piece::Fixed))))(input)
}

fn pieces(input: &str) -> IResult<&str, Vec<Piece>> {
    all_consuming(terminated(many0(piece), multispace0))(input)
}

/// Parse a mana cost string
pub fn parse_mana_cost(input: &str) -> Result<ManaCost> {
    let (_, parsed) = pieces(input)
        .map_err(|e| MtgError::ParseError(format!("invalid mana cost '{input}': {e}")))?;

    let mut cost = ManaCost::new();
    for piece in parsed {
        match piece {
            Piece::Fixed(symbols) => cost.fixed += symbols,
            Piece::Choice(alternatives) => cost = cost.with_choice(alternatives),
        }
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_braced_cost() {
        let cost = parse_mana_cost("{2}{R}{R}").unwrap();
        assert_eq!(cost.fixed.generic, 2);
        assert_eq!(cost.fixed.red, 2);
        assert!(cost.choices.is_empty());
        assert_eq!(cost.value(), 4);
    }

    #[test]
    fn test_parse_bare_shorthand() {
        let cost = parse_mana_cost("1UB").unwrap();
        assert_eq!(cost.fixed.generic, 1);
        assert_eq!(cost.fixed.blue, 1);
        assert_eq!(cost.fixed.black, 1);
    }

    #[test]
    fn test_parse_hybrid_groups() {
        let cost = parse_mana_cost("{2}{R/W}{G}").unwrap();
        assert_eq!(cost.fixed, ManaSymbols::generic(2) + ManaSymbols::of(Color::Green, 1));
        assert_eq!(cost.choices.len(), 1);
        assert_eq!(
            cost.choices[0].alternatives.as_slice(),
            &[ManaSymbols::of(Color::Red, 1), ManaSymbols::of(Color::White, 1)]
        );
        assert_eq!(cost.to_string(), "{2}{R/W}{G}");
    }

    #[test]
    fn test_parse_monocolored_hybrid() {
        let cost = parse_mana_cost("{2/U}{2/U}").unwrap();
        assert_eq!(cost.choices.len(), 2);
        assert_eq!(cost.value(), 4);
    }

    #[test]
    fn test_parse_empty_and_whitespace() {
        assert!(parse_mana_cost("").unwrap().is_free());
        let cost = parse_mana_cost(" {1} {G} ").unwrap();
        assert_eq!(cost.value(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_mana_cost("{X}"), Err(MtgError::ParseError(_))));
        assert!(parse_mana_cost("{R").is_err());
        assert!(parse_mana_cost("2Q").is_err());
    }
}
