use nom::{
    branch::alt,
    bytes::complete::{is_a, tag},
    character::{
        complete::{digit1, space1},
        is_digit,
    },
    combinator::{map, map_res, verify},
    sequence::tuple,
    IResult,
};

use crate::ast::{Command::*, Segment::*, *};
use crate::error::Error;

/// Forward-only cursor over the command lines of one translation unit.
/// Comments (`//` to end of line) and blank lines are stripped up front;
/// the relative order of the surviving lines is preserved.
pub struct CommandSource {
    lines: Vec<String>,
    cursor: usize,
}

impl CommandSource {
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        CommandSource { lines, cursor: 0 }
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.lines.len()
    }

    /// Returns the next command line. Callers must check `has_next` first.
    pub fn advance(&mut self) -> &str {
        let line = &self.lines[self.cursor];
        self.cursor += 1;
        line
    }
}

fn integer(input: &str) -> IResult<&str, u16> {
    map_res(digit1, |c: &str| c.parse())(input)
}

fn segment(input: &str) -> IResult<&str, Segment> {
    map(
        alt((
            tag("constant"),
            tag("local"),
            tag("static"),
            tag("argument"),
            tag("this"),
            tag("that"),
            tag("pointer"),
            tag("temp"),
        )),
        |seg| match seg {
            "constant" => Constant,
            "local" => Local,
            "static" => Static,
            "argument" => Argument,
            "this" => This,
            "that" => That,
            "pointer" => Pointer,
            "temp" => Temp,
            _ => panic!("Unexpected parse {}", seg),
        },
    )(input)
}

/// Operand validation the generator relies on: `constant` is push-only,
/// `pointer` addresses only THIS/THAT, `temp` spans eight cells.
fn valid_target(command: &Command) -> bool {
    match command {
        Pop(Constant, _) => false,
        Push(Pointer, arg) | Pop(Pointer, arg) => *arg < 2,
        Push(Temp, arg) | Pop(Temp, arg) => *arg < 8,
        _ => true,
    }
}

fn push(input: &str) -> IResult<&str, Command> {
    verify(
        map(
            tuple((tag("push"), space1, segment, space1, integer)),
            |(_, _, segment, _, arg)| Push(segment, arg),
        ),
        valid_target,
    )(input)
}

fn pop(input: &str) -> IResult<&str, Command> {
    verify(
        map(
            tuple((tag("pop"), space1, segment, space1, integer)),
            |(_, _, segment, _, arg)| Pop(segment, arg),
        ),
        valid_target,
    )(input)
}

fn prim(input: &str) -> IResult<&str, Command> {
    map(
        alt((
            tag("add"),
            tag("sub"),
            tag("neg"),
            tag("eq"),
            tag("gt"),
            tag("lt"),
            tag("and"),
            tag("or"),
            tag("not"),
        )),
        |prim| match prim {
            "add" => Add,
            "sub" => Sub,
            "neg" => Neg,
            "eq" => Eq,
            "gt" => Gt,
            "lt" => Lt,
            "and" => And,
            "or" => Or,
            "not" => Not,
            _ => panic!("Unexpected parse {}", prim),
        },
    )(input)
}

fn symbol(input: &str) -> IResult<&str, String> {
    map(
        verify(
            is_a("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_.$:0123456789"),
            |c: &str| !is_digit(c.as_bytes()[0]),
        ),
        |sym: &str| sym.to_string(),
    )(input)
}

fn branching(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("label"), tag("goto"), tag("if-goto"))),
            space1,
            symbol,
        )),
        |(op, _, sym)| match op {
            "label" => Label(sym),
            "goto" => Goto(sym),
            "if-goto" => IfGoto(sym),
            _ => panic!("Unexpected parse {}", op),
        },
    )(input)
}

fn function_or_call(input: &str) -> IResult<&str, Command> {
    map(
        tuple((
            alt((tag("function"), tag("call"))),
            space1,
            symbol,
            space1,
            integer,
        )),
        |(op, _, sym, _, arg)| match op {
            "function" => Function(sym, arg),
            _ => Call(sym, arg),
        },
    )(input)
}

fn ret(input: &str) -> IResult<&str, Command> {
    map(tag("return"), |_| Return)(input)
}

/// Classifies one stripped, non-empty command line. The first
/// whitespace-separated token selects the category from the fixed keyword
/// table; the matching operand grammar must then consume the whole line.
pub fn classify(line: &str) -> Result<Command, Error> {
    let keyword = line.split_whitespace().next().unwrap_or("");
    let parsed = match keyword {
        "push" => push(line),
        "pop" => pop(line),
        "add" | "sub" | "neg" | "eq" | "gt" | "lt" | "and" | "or" | "not" => prim(line),
        "label" | "goto" | "if-goto" => branching(line),
        "function" | "call" => function_or_call(line),
        "return" => ret(line),
        _ => return Err(Error::UnknownCommand(line.to_string())),
    };

    match parsed {
        Ok(("", command)) => Ok(command),
        Ok((rest, _)) => Err(Error::MalformedOperand {
            line: line.to_string(),
            detail: format!("unexpected trailing `{}`", rest.trim()),
        }),
        Err(_) => Err(Error::MalformedOperand {
            line: line.to_string(),
            detail: format!("operands do not fit the `{}` grammar", keyword),
        }),
    }
}

/// Strips and classifies a whole translation unit in one pass.
pub fn parse(input: &str) -> Result<Vec<Command>, Error> {
    let mut source = CommandSource::from_text(input);
    let mut commands = vec![];
    while source.has_next() {
        commands.push(classify(source.advance())?);
    }
    Ok(commands)
}

#[test]
fn test_push() {
    assert_eq!(push("push  pointer  1"), Ok(("", Push(Pointer, 1))));
    assert_eq!(push("push local 32"), Ok(("", Push(Local, 32))));
}

#[test]
fn test_prim() {
    assert_eq!(prim("neg"), Ok(("", Neg)));
}

#[test]
fn test_branching() {
    assert_eq!(classify("if-goto LOOP_1").unwrap(), IfGoto("LOOP_1".to_string()));
    assert_eq!(classify("label end$cond").unwrap(), Label("end$cond".to_string()));
}

#[test]
fn test_function_and_call() {
    assert_eq!(
        classify("function Sys.init 2").unwrap(),
        Function("Sys.init".to_string(), 2)
    );
    assert_eq!(classify("call Math.max 2").unwrap(), Call("Math.max".to_string(), 2));
    assert_eq!(classify("return").unwrap(), Return);
}

#[test]
fn test_unknown_command() {
    assert!(matches!(classify("foo 1 2"), Err(Error::UnknownCommand(_))));
}

#[test]
fn test_malformed_operands() {
    assert!(matches!(classify("pop constant 3"), Err(Error::MalformedOperand { .. })));
    assert!(matches!(classify("push pointer 2"), Err(Error::MalformedOperand { .. })));
    assert!(matches!(classify("pop temp 8"), Err(Error::MalformedOperand { .. })));
    assert!(matches!(classify("push local x"), Err(Error::MalformedOperand { .. })));
    assert!(matches!(classify("push local"), Err(Error::MalformedOperand { .. })));
    assert!(matches!(classify("add 1"), Err(Error::MalformedOperand { .. })));
    assert!(matches!(classify("return 0"), Err(Error::MalformedOperand { .. })));
}

#[test]
fn test_source_stripping() {
    let mut source = CommandSource::from_text(
        "// a program\n\npush constant 1 // inline comment\n   \nadd\n",
    );
    assert!(source.has_next());
    assert_eq!(source.advance(), "push constant 1");
    assert_eq!(source.advance(), "add");
    assert!(!source.has_next());
}

#[test]
fn test_parse_unit() {
    let commands = parse("push constant 2\npush constant 3\nadd // sum\n").unwrap();
    assert_eq!(commands, vec![Push(Constant, 2), Push(Constant, 3), Add]);
}
