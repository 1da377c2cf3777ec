//! End-to-end tests: translate VM programs and execute the generated
//! assembly on a minimal interpreter for the generated Hack subset.

use std::collections::HashMap;

use vm_translator::error::Error;
use vm_translator::translate_unit;

enum Instr {
    At(i16),
    C {
        dest: String,
        comp: String,
        jump: String,
    },
}

fn predefined(sym: &str) -> Option<i16> {
    match sym {
        "SP" => Some(0),
        "LCL" => Some(1),
        "ARG" => Some(2),
        "THIS" => Some(3),
        "THAT" => Some(4),
        _ => sym
            .strip_prefix('R')
            .and_then(|n| n.parse::<i16>().ok())
            .filter(|n| (0..16).contains(n)),
    }
}

/// Two-pass symbol resolution over the emitted lines: labels first, then
/// variables (static cells) from address 16 up.
fn assemble(asm: &[String]) -> Vec<Instr> {
    let significant: Vec<&str> = asm
        .iter()
        .map(|line| line.as_str())
        .filter(|line| !line.starts_with("//"))
        .collect();

    let mut symbols: HashMap<String, i16> = HashMap::new();
    let mut address = 0i16;
    for line in &significant {
        if let Some(label) = line.strip_prefix('(') {
            let label = label.trim_end_matches(')');
            symbols.insert(label.to_string(), address);
        } else {
            address += 1;
        }
    }

    let mut next_var = 16i16;
    let mut instrs = vec![];
    for line in &significant {
        if line.starts_with('(') {
            continue;
        }
        if let Some(target) = line.strip_prefix('@') {
            let value = if let Ok(n) = target.parse::<i16>() {
                n
            } else if let Some(n) = predefined(target) {
                n
            } else if let Some(n) = symbols.get(target) {
                *n
            } else {
                symbols.insert(target.to_string(), next_var);
                next_var += 1;
                next_var - 1
            };
            instrs.push(Instr::At(value));
        } else {
            let (rest, jump) = match line.split_once(';') {
                Some((rest, jump)) => (rest, jump),
                None => (*line, ""),
            };
            let (dest, comp) = match rest.split_once('=') {
                Some((dest, comp)) => (dest, comp),
                None => ("", rest),
            };
            instrs.push(Instr::C {
                dest: dest.to_string(),
                comp: comp.to_string(),
                jump: jump.to_string(),
            });
        }
    }
    instrs
}

fn alu(comp: &str, a: i16, d: i16, m: i16) -> i16 {
    match comp {
        "0" => 0,
        "1" => 1,
        "-1" => -1,
        "D" => d,
        "A" => a,
        "M" => m,
        "!D" => !d,
        "!A" => !a,
        "!M" => !m,
        "-D" => d.wrapping_neg(),
        "-M" => m.wrapping_neg(),
        "D+1" => d.wrapping_add(1),
        "A+1" => a.wrapping_add(1),
        "M+1" => m.wrapping_add(1),
        "D-1" => d.wrapping_sub(1),
        "A-1" => a.wrapping_sub(1),
        "M-1" => m.wrapping_sub(1),
        "D+A" | "A+D" => d.wrapping_add(a),
        "D+M" | "M+D" => d.wrapping_add(m),
        "D-A" => d.wrapping_sub(a),
        "A-D" => a.wrapping_sub(d),
        "D-M" => d.wrapping_sub(m),
        "M-D" => m.wrapping_sub(d),
        "D&A" | "A&D" => d & a,
        "D&M" | "M&D" => d & m,
        "D|A" | "A|D" => d | a,
        "D|M" | "M|D" => d | m,
        other => panic!("unsupported comp {other}"),
    }
}

fn execute(asm: &[String]) -> Vec<i16> {
    let instrs = assemble(asm);
    let mut ram = vec![0i16; 32768];
    ram[0] = 256; // SP
    ram[1] = 300; // LCL
    ram[2] = 400; // ARG
    ram[3] = 3000; // THIS
    ram[4] = 3010; // THAT

    let mut a = 0i16;
    let mut d = 0i16;
    let mut pc = 0usize;
    let mut steps = 0u32;
    while pc < instrs.len() {
        steps += 1;
        assert!(steps < 100_000, "runaway program");
        match &instrs[pc] {
            Instr::At(value) => {
                a = *value;
                pc += 1;
            }
            Instr::C { dest, comp, jump } => {
                let addr = a as usize;
                let value = alu(comp, a, d, ram[addr]);
                // M writes use the pre-instruction A, as the CPU does
                if dest.contains('M') {
                    ram[addr] = value;
                }
                if dest.contains('A') {
                    a = value;
                }
                if dest.contains('D') {
                    d = value;
                }
                let taken = match jump.trim() {
                    "" => false,
                    "JGT" => value > 0,
                    "JEQ" => value == 0,
                    "JGE" => value >= 0,
                    "JLT" => value < 0,
                    "JNE" => value != 0,
                    "JLE" => value <= 0,
                    "JMP" => true,
                    other => panic!("unsupported jump {other}"),
                };
                if taken {
                    pc = a as usize;
                } else {
                    pc += 1;
                }
            }
        }
    }
    ram
}

fn run_unit(program: &str) -> Vec<i16> {
    let asm = translate_unit("Test", program).expect("program should translate");
    execute(&asm)
}

fn sp(ram: &[i16]) -> i16 {
    ram[0]
}

fn top(ram: &[i16]) -> i16 {
    ram[ram[0] as usize - 1]
}

#[test]
fn subtraction_leaves_difference_on_top() {
    let ram = run_unit("push constant 7\npush constant 2\nsub");
    assert_eq!(top(&ram), 5);
    assert_eq!(sp(&ram), 257);
}

#[test]
fn arithmetic_and_logic_operators() {
    assert_eq!(top(&run_unit("push constant 7\npush constant 2\nadd")), 9);
    assert_eq!(top(&run_unit("push constant 3\npush constant 5\nand")), 1);
    assert_eq!(top(&run_unit("push constant 3\npush constant 5\nor")), 7);
    assert_eq!(top(&run_unit("push constant 9\nneg")), -9);
    assert_eq!(top(&run_unit("push constant 0\nnot")), -1);
}

#[test]
fn comparison_sentinels() {
    let cases = [
        ("push constant 5\npush constant 5\neq", -1),
        ("push constant 5\npush constant 3\ngt", -1),
        ("push constant 3\npush constant 5\nlt", -1),
        ("push constant 5\npush constant 3\neq", 0),
        ("push constant 3\npush constant 5\ngt", 0),
        ("push constant 5\npush constant 3\nlt", 0),
    ];
    for (program, sentinel) in cases {
        let ram = run_unit(program);
        assert_eq!(top(&ram), sentinel, "program: {program}");
        assert_eq!(sp(&ram), 257, "program: {program}");
    }
}

#[test]
fn stack_balance_per_operator() {
    // push nets +1
    assert_eq!(sp(&run_unit("push constant 1")), 257);
    // unary nets 0
    assert_eq!(sp(&run_unit("push constant 1\nneg")), 257);
    // binary nets -1
    assert_eq!(sp(&run_unit("push constant 1\npush constant 2\nadd")), 257);
    // pop nets -1
    assert_eq!(sp(&run_unit("push constant 1\npop local 0")), 256);
}

#[test]
fn local_write_then_read_back_identity() {
    let ram = run_unit("push constant 42\npop local 2\npush local 2");
    assert_eq!(top(&ram), 42);
    assert_eq!(ram[302], 42);
}

#[test]
fn argument_pointer_temp_and_static_cells() {
    let ram = run_unit("push constant 11\npop argument 3");
    assert_eq!(ram[403], 11);

    let ram = run_unit("push constant 9\npop pointer 1\npush pointer 1");
    assert_eq!(ram[4], 9);
    assert_eq!(top(&ram), 9);

    let ram = run_unit("push constant 6\npop temp 3");
    assert_eq!(ram[8], 6);

    let ram = run_unit("push constant 8\npop static 3\npush static 3");
    assert_eq!(top(&ram), 8);
}

#[test]
fn branching_loop_sums_to_fifteen() {
    let program = "\
push constant 0
pop local 0
push constant 5
pop local 1
label LOOP
push local 1
push constant 0
eq
if-goto END
push local 0
push local 1
add
pop local 0
push local 1
push constant 1
sub
pop local 1
goto LOOP
label END
push local 0";
    assert_eq!(top(&run_unit(program)), 15);
}

#[test]
fn unknown_command_finalizes_no_output() {
    let dir = std::env::temp_dir();
    let input = dir.join("vm_translator_bad_unit.vm");
    let output = dir.join("vm_translator_bad_unit.asm");
    let _ = std::fs::remove_file(&output);
    std::fs::write(&input, "push constant 1\nfoo 1 2\n").unwrap();

    let err = vm_translator::run(&input).unwrap_err();
    assert!(matches!(err, Error::UnknownCommand(_)));
    assert!(!output.exists());

    let _ = std::fs::remove_file(&input);
}

#[test]
fn run_swaps_extension_and_writes_assembly() {
    let dir = std::env::temp_dir();
    let input = dir.join("vm_translator_good_unit.vm");
    std::fs::write(&input, "push constant 7\npush constant 2\nsub\n").unwrap();

    let output = vm_translator::run(&input).unwrap();
    assert_eq!(output, dir.join("vm_translator_good_unit.asm"));
    let asm: Vec<String> = std::fs::read_to_string(&output)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(top(&execute(&asm)), 5);

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&output);
}
