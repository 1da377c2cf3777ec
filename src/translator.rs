use crate::ast::{Command::*, Segment::*, *};
use crate::error::Error;

macro_rules! svec {
    ($($x:expr),*) => (vec![$($x.to_string()),*]);
}

fn at_c(arg: &u16) -> String {
    format!("@{arg}", arg = arg)
}

fn at_s(arg: &str) -> String {
    format!("@{arg}", arg = arg)
}

fn pointer_arg(arg: &u16) -> String {
    match arg {
        0 => "THIS",
        1 => "THAT",
        _ => panic!("Invalid pointer {}", arg),
    }
    .to_string()
}

/// Push microcode for the four base-pointer segments
fn seg_push(seg_name: &str, seg: &str, arg: &u16) -> Vec<String> {
    svec![
        format!("// push {} {}", seg_name, arg),
        at_s(seg),
        "D=M",
        at_c(arg),
        "A=A+D", // A = SEG+arg
        "D=M",   // D = value to push
        "@SP",
        "M=M+1",
        "A=M-1", // Don't need to refetch SP; this is safe
        "M=D"
    ]
}

fn seg_push_direct(seg_name: &str, arg: &u16, label: String) -> Vec<String> {
    svec![
        format!("// push {} {}", seg_name, arg),
        format!("@{}", label),
        "D=M",
        "@SP",
        "M=M+1",
        "A=M-1",
        "M=D"
    ]
}

fn seg_pop(seg_name: &str, seg: &str, arg: &u16) -> Vec<String> {
    svec![
        format!("// pop {} {}", seg_name, arg),
        at_s(seg),
        "D=M",
        at_c(arg),
        "D=A+D", // D = SEG+arg
        "@R13",
        "M=D", // Store target addr in R13
        "@SP",
        "AM=M-1", // SP--, A <- new SP (val to be popped)
        "D=M",
        "@R13",
        "A=M", // At the target's address...
        "M=D"  // ... store the popped val
    ]
}

fn seg_pop_direct(seg_name: &str, arg: &u16, label: String) -> Vec<String> {
    svec![
        format!("// pop {} {}", seg_name, arg),
        "@SP",
        "AM=M-1",
        "D=M",
        format!("@{}", label),
        "M=D"
    ]
}

fn simple_un_op(name: &str, op: char) -> Vec<String> {
    svec![format!("// {}", name), "@SP", "A=M-1", format!("M={}M", op)]
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(name: &str, op: char) -> Vec<String> {
    svec![
        format!("// {}", name),
        "@SP",
        "AM=M-1",              // SP--, looking at top of stack now
        "D=M",                 // Right arg in D
        "A=A-1",               // Looking at second arg of stack, will overwrite
        format!("M=M{}D", op)  // Op and overwrite second element
    ]
}

/// Code generator for one translation unit. Owns the unit's base name
/// (scopes static cells and minted branch labels) and the counter that
/// keeps comparison labels unique.
pub struct Translator<'a> {
    unit: &'a str,
    gen_sym: usize,
}

impl<'a> Translator<'a> {
    pub fn new(unit: &'a str) -> Self {
        Translator { unit, gen_sym: 0 }
    }

    fn next_gen_sym(&mut self) -> usize {
        let tmp = self.gen_sym;
        self.gen_sym += 1;
        tmp
    }

    fn push(&self, segment: &Segment, arg: &u16) -> Vec<String> {
        match segment {
            Constant => svec![
                format!("// push constant {}", arg),
                at_c(arg),
                "D=A",
                "@SP",
                "A=M",
                "M=D",
                "@SP",
                "M=M+1"
            ],
            Local => seg_push("local", "LCL", arg),
            Argument => seg_push("argument", "ARG", arg),
            This => seg_push("this", "THIS", arg),
            That => seg_push("that", "THAT", arg),
            Static => seg_push_direct("static", arg, format!("{}.{}", self.unit, arg)),
            Temp => seg_push_direct("temp", arg, format!("R{}", arg + 5)),
            Pointer => seg_push_direct("pointer", arg, pointer_arg(arg)),
        }
    }

    fn pop(&self, segment: &Segment, arg: &u16) -> Vec<String> {
        match segment {
            Constant => panic!("Should not pop constants"),
            Local => seg_pop("local", "LCL", arg),
            Argument => seg_pop("argument", "ARG", arg),
            This => seg_pop("this", "THIS", arg),
            That => seg_pop("that", "THAT", arg),
            Static => seg_pop_direct("static", arg, format!("{}.{}", self.unit, arg)),
            Temp => seg_pop_direct("temp", arg, format!("R{}", arg + 5)),
            Pointer => seg_pop_direct("pointer", arg, pointer_arg(arg)),
        }
    }

    fn compare(&mut self, cmp_name: &str, jump: &str) -> Vec<String> {
        let sym = self.next_gen_sym();
        let cmp_sym = format!("{}:CMP_{}", self.unit, sym);
        let end_sym = format!("{}:ENDCMP_{}", self.unit, sym);
        svec![
            format!("// {}", cmp_name),
            "@SP",
            "AM=M-1", // SP--, looking at top of stack now
            "D=M",    // Right arg in D
            "A=A-1",  // Looking at second arg of stack, will overwrite
            "D=M-D",
            format!("@{}", cmp_sym),
            format!("D;J{}", jump),
            "D=0",
            format!("@{}", end_sym),
            "0;JMP",
            format!("({})", cmp_sym),
            "D=-1",
            format!("({})", end_sym),
            "@SP",
            "A=M-1",
            "M=D"
        ]
    }

    /// Convert VM label to ASM symbol - for consistency across instructions
    fn label_to_sym(&self, label: &str) -> String {
        format!("{}:LABEL_{}", self.unit, label)
    }

    fn label(&self, label: &str) -> Vec<String> {
        svec![
            format!("// label {}", label),
            format!("({})", self.label_to_sym(label))
        ]
    }

    fn goto(&self, label: &str) -> Vec<String> {
        svec![
            format!("// goto {}", label),
            format!("@{}", self.label_to_sym(label)),
            "0;JMP" // Unconditional jump
        ]
    }

    fn if_goto(&self, label: &str) -> Vec<String> {
        svec![
            format!("// if-goto {}", label),
            "@SP",
            "AM=M-1",
            "D=M",  // Stack popped into D
            format!("@{}", self.label_to_sym(label)),
            "D;JNE" // False is 0
        ]
    }

    /// Translates one classified command into its assembly expansion.
    pub fn command(&mut self, command: &Command) -> Result<Vec<String>, Error> {
        log::trace!("translating {:?}", command);
        let translated = match command {
            Push(seg, arg) => self.push(seg, arg),
            Pop(seg, arg) => self.pop(seg, arg),
            Not => simple_un_op("not", '!'),
            Neg => simple_un_op("neg", '-'),
            Add => simple_bin_op("add", '+'),
            Sub => simple_bin_op("sub", '-'),
            And => simple_bin_op("and", '&'),
            Or => simple_bin_op("or", '|'),
            Eq => self.compare("eq", "EQ"),
            Gt => self.compare("gt", "GT"),
            Lt => self.compare("lt", "LT"),
            Label(sym) => self.label(sym),
            Goto(sym) => self.goto(sym),
            IfGoto(sym) => self.if_goto(sym),
            Function(sym, _) => return Err(Error::Unsupported(format!("function {}", sym))),
            Call(sym, _) => return Err(Error::Unsupported(format!("call {}", sym))),
            Return => return Err(Error::Unsupported("return".to_string())),
        };
        Ok(translated)
    }

    pub fn translate(&mut self, commands: &[Command]) -> Result<Vec<String>, Error> {
        let mut instructions: Vec<String> = vec![];

        for command in commands {
            instructions.extend(self.command(command)?);
        }

        Ok(instructions)
    }
}
