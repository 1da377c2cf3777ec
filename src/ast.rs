#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Segment {
    Constant,
    Local,
    Static,
    Argument,
    This,
    That,
    Pointer,
    Temp,
}

/// One classified VM command. Immutable once classified; built by the
/// parser, consumed once by the translator, then discarded.
#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    // Stack Basics
    Push(Segment, u16),
    Pop(Segment, u16),
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,

    // Control
    Label(String),
    Goto(String),
    IfGoto(String),

    // Classified but not translated; see Translator::command.
    Function(String, u16),
    Call(String, u16),
    Return,
}
