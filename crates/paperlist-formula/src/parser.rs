//! Recursive-descent parser that resolves names against the conference.
//!
//! Precedence, loosest first: `?:`, `||`, `&&`, comparisons, `+ -`,
//! `* / %`, unary `- !`.

use std::collections::BTreeSet;

use paperlist_model::{ConferenceSettings, ContactId, ViewScore, tags};

use crate::ast::{AggregateKind, Attribute, Expr, ScalarFn};
use crate::error::FormulaError;
use crate::lexer::{Op, Token, tokenize};
use crate::value::FormulaValue;

/// Data a formula needs fetched before it can be evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Needs {
    pub flags: BTreeSet<&'static str>,
    pub scores: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub expr: Expr,
    /// Lowest view score among everything the formula reads.
    pub view_score: ViewScore,
    pub needs: Needs,
}

pub fn parse(source: &str, settings: &ConferenceSettings) -> Result<Parsed, FormulaError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        settings,
        aggregate_depth: 0,
        view_score: ViewScore::AUTHOR,
        needs: Needs::default(),
    };
    let expr = parser.ternary()?;
    if let Some(token) = parser.peek() {
        return Err(FormulaError::Syntax {
            near: token.describe(),
        });
    }
    Ok(Parsed {
        expr,
        view_score: parser.view_score,
        needs: parser.needs,
    })
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    settings: &'a ConferenceSettings,
    aggregate_depth: usize,
    view_score: ViewScore,
    needs: Needs,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, FormulaError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(FormulaError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), FormulaError> {
        let token = self.next()?;
        if &token == expected {
            Ok(())
        } else {
            Err(FormulaError::Syntax {
                near: token.describe(),
            })
        }
    }

    fn eat_op(&mut self, ops: &[Op]) -> Option<Op> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn lower_view_score(&mut self, score: ViewScore) {
        self.view_score = self.view_score.min(score);
    }

    fn ternary(&mut self) -> Result<Expr, FormulaError> {
        let condition = self.binary_level(0)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then = self.ternary()?;
        self.expect(&Token::Colon)?;
        let otherwise = self.ternary()?;
        Ok(Expr::Ternary(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn binary_level(&mut self, level: usize) -> Result<Expr, FormulaError> {
        const LEVELS: [&[Op]; 5] = [
            &[Op::Or],
            &[Op::And],
            &[Op::Eq, Op::Ne, Op::Lt, Op::Le, Op::Gt, Op::Ge],
            &[Op::Plus, Op::Minus],
            &[Op::Star, Op::Slash, Op::Percent],
        ];
        let Some(ops) = LEVELS.get(level) else {
            return self.unary();
        };
        let mut left = self.binary_level(level + 1)?;
        while let Some(op) = self.eat_op(ops) {
            let right = self.binary_level(level + 1)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if let Some(op) = self.eat_op(&[Op::Minus, Op::Not]) {
            let operand = self.unary()?;
            return Ok(Expr::Unary(op, Box::new(operand)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        match self.next()? {
            Token::Number(n) => Ok(Expr::Constant(FormulaValue::Number(n))),
            Token::LParen => {
                let inner = self.ternary()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Tag(tag) => {
                if tags::canonical_tag(&tag, ContactId::default()).is_none() {
                    return Err(FormulaError::InvalidTag { tag });
                }
                self.lower_view_score(ViewScore::PC);
                self.needs.flags.insert("tags");
                Ok(Expr::Tag(tag))
            }
            Token::Ident(name) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                self.call(&name)
            }
            Token::Ident(name) => self.identifier(&name),
            other => Err(FormulaError::Syntax {
                near: other.describe(),
            }),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, FormulaError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.ternary()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(&Token::Comma)?;
        }
    }

    fn call(&mut self, name: &str) -> Result<Expr, FormulaError> {
        let lname = name.to_lowercase();
        if let Some(kind) = AggregateKind::from_name(&lname) {
            self.aggregate_depth += 1;
            let args = self.arguments();
            self.aggregate_depth -= 1;
            let mut args = args?;
            if args.len() > 1 && matches!(kind, AggregateKind::Min | AggregateKind::Max) {
                if self.aggregate_depth == 0
                    && let Some(field) = args.iter().find_map(bare_score)
                {
                    return Err(FormulaError::ScoreOutsideAggregate {
                        name: field.to_string(),
                    });
                }
                let scalar = if kind == AggregateKind::Min {
                    ScalarFn::Least
                } else {
                    ScalarFn::Greatest
                };
                return Ok(Expr::Call(scalar, args));
            }
            if args.len() != 1 {
                return Err(FormulaError::Arity {
                    name: kind.name().to_string(),
                    expected: "1",
                    actual: args.len(),
                });
            }
            self.needs.flags.insert("reviewList");
            let inner = args.remove(0);
            return Ok(Expr::Aggregate(kind, Box::new(inner)));
        }
        if let Some(function) = ScalarFn::from_name(&lname) {
            let args = self.arguments()?;
            let (min, max, expected) = function.arity();
            if args.len() < min || args.len() > max {
                return Err(FormulaError::Arity {
                    name: lname,
                    expected,
                    actual: args.len(),
                });
            }
            return Ok(Expr::Call(function, args));
        }
        Err(FormulaError::UnknownFunction {
            name: name.to_string(),
        })
    }

    fn identifier(&mut self, name: &str) -> Result<Expr, FormulaError> {
        let lname = name.to_lowercase();
        match lname.as_str() {
            "true" => return Ok(Expr::Constant(FormulaValue::Bool(true))),
            "false" => return Ok(Expr::Constant(FormulaValue::Bool(false))),
            "null" => return Ok(Expr::Constant(FormulaValue::Null)),
            _ => {}
        }
        if let Some(attribute) = Attribute::from_name(&lname) {
            self.lower_view_score(attribute.view_score());
            let in_aggregate = self.aggregate_depth > 0;
            match attribute {
                Attribute::TopicScore => {
                    self.needs.flags.insert("topics");
                    self.needs.flags.insert("topicInterestScore");
                }
                Attribute::Preference if in_aggregate => {
                    self.needs.flags.insert("allReviewerPreference");
                }
                Attribute::Preference => {
                    self.needs.flags.insert("reviewerPreference");
                }
                Attribute::Conflict => {
                    self.needs.flags.insert("allConflictType");
                }
                Attribute::PaperId | Attribute::Outcome | Attribute::ReviewType => {}
            }
            return Ok(Expr::Attribute(attribute));
        }
        if let Some(field) = self
            .settings
            .review_field(name)
            .filter(|field| field.has_options())
        {
            if self.aggregate_depth == 0 {
                return Err(FormulaError::ScoreOutsideAggregate {
                    name: name.to_string(),
                });
            }
            self.lower_view_score(field.view_score);
            self.needs.scores.insert(field.id.clone());
            return Ok(Expr::Score {
                field_id: field.id.clone(),
                view_score: field.view_score,
            });
        }
        Err(FormulaError::UnknownIdentifier {
            name: name.to_string(),
        })
    }
}

/// A score reference not wrapped by any aggregate.
fn bare_score(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Score { field_id, .. } => Some(field_id),
        Expr::Aggregate(..) | Expr::Constant(_) | Expr::Attribute(_) | Expr::Tag(_) => None,
        Expr::Unary(_, inner) => bare_score(inner),
        Expr::Binary(_, left, right) => bare_score(left).or_else(|| bare_score(right)),
        Expr::Ternary(a, b, c) => bare_score(a)
            .or_else(|| bare_score(b))
            .or_else(|| bare_score(c)),
        Expr::Call(_, args) => args.iter().find_map(bare_score),
    }
}

#[cfg(test)]
mod tests {
    use paperlist_model::ReviewField;

    use super::*;

    fn settings() -> ConferenceSettings {
        ConferenceSettings {
            review_fields: vec![
                ReviewField {
                    id: "overAllMerit".to_string(),
                    name: "Overall merit".to_string(),
                    abbreviation: "OveMer".to_string(),
                    options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                    ..ReviewField::default()
                },
                ReviewField {
                    id: "confidence".to_string(),
                    name: "Confidence".to_string(),
                    abbreviation: "Conf".to_string(),
                    options: vec!["low".into(), "high".into()],
                    view_score: ViewScore::REVIEWER_ONLY,
                    ..ReviewField::default()
                },
            ],
            ..ConferenceSettings::default()
        }
    }

    #[test]
    fn precedence_binds_multiplication_tighter() {
        let parsed = parse("1 + 2 * 3", &settings()).expect("parse");
        let Expr::Binary(Op::Plus, _, right) = parsed.expr else {
            panic!("expected addition at the root");
        };
        assert!(matches!(*right, Expr::Binary(Op::Star, _, _)));
    }

    #[test]
    fn view_score_is_minimum_of_references() {
        let parsed = parse("avg(OveMer) + max(Conf)", &settings()).expect("parse");
        assert_eq!(parsed.view_score, ViewScore::REVIEWER_ONLY);
        assert!(parsed.needs.scores.contains("confidence"));

        let constant = parse("pid * 2", &settings()).expect("parse");
        assert_eq!(constant.view_score, ViewScore::AUTHOR);
    }

    #[test]
    fn scores_need_an_aggregate() {
        assert_eq!(
            parse("OveMer + 1", &settings()).map(|p| p.expr),
            Err(FormulaError::ScoreOutsideAggregate {
                name: "OveMer".to_string()
            })
        );
        assert!(parse("max(OveMer, 2)", &settings()).is_err());
        assert!(parse("max(avg(OveMer), 2)", &settings()).is_ok());
    }

    #[test]
    fn reports_unknown_names() {
        assert_eq!(
            parse("frobnicate(pid)", &settings()).map(|p| p.expr),
            Err(FormulaError::UnknownFunction {
                name: "frobnicate".to_string()
            })
        );
        assert_eq!(
            parse("Novelty", &settings()).map(|p| p.expr),
            Err(FormulaError::UnknownIdentifier {
                name: "Novelty".to_string()
            })
        );
        assert_eq!(
            parse("(pid", &settings()).map(|p| p.expr),
            Err(FormulaError::UnexpectedEnd)
        );
        assert_eq!(
            parse("pid pid", &settings()).map(|p| p.expr),
            Err(FormulaError::Syntax {
                near: "pid".to_string()
            })
        );
    }
}
