#![no_main]

use circuit_ssa::{Circuit, CompilationConfig, Environment, Label, OpCode, Variable, VariableType};
use libfuzzer_sys::fuzz_target;

const VARIABLES: usize = 4;

fn pick<T: Copy>(items: &[T], byte: u8) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[byte as usize % items.len()])
    }
}

fuzz_target!(|data: &[u8]| {
    let mut circuit = Circuit::new();
    let mut env = Environment::new(&mut circuit, CompilationConfig::minimal(), 2);

    let mut variables: Vec<Variable> = Vec::with_capacity(VARIABLES);
    for index in 0..VARIABLES {
        let var_type = if index % 2 == 0 {
            VariableType::JS_ANY
        } else {
            VariableType::INT32
        };
        variables.push(env.declare(var_type));
    }
    let mut labels: Vec<Label> = vec![env.entry_label()];
    let mut values = env.arguments().to_vec();

    for chunk in data.chunks_exact(3) {
        let (op, a, b) = (chunk[0], chunk[1], chunk[2]);
        match op % 12 {
            0 => labels.push(env.new_label()),
            1 => {
                if let Some(target) = pick(&labels, a) {
                    let _ = env.jump(target);
                }
            }
            2 => {
                if let Some(target) = pick(&labels, a) {
                    let _ = env.bind(target);
                }
            }
            3 => {
                if let (Some(cond), Some(t), Some(f)) = (pick(&values, a), pick(&labels, b), pick(&labels, a ^ b)) {
                    let _ = env.branch(cond, t, f);
                }
            }
            4 => {
                if let Some(head) = pick(&labels, a) {
                    let _ = env.loop_begin(head);
                }
            }
            5 => {
                if let Some(head) = pick(&labels, a) {
                    let _ = env.loop_end(head);
                }
            }
            6 => {
                if let Some(var) = pick(&variables, a) {
                    if let Ok(value) = env.read(var) {
                        values.push(value);
                    }
                }
            }
            7 => {
                if let (Some(var), Some(value)) = (pick(&variables, a), pick(&values, b)) {
                    let _ = env.write(var, value);
                }
            }
            8 => {
                if let Some(value) = pick(&values, a) {
                    let _ = env.append_effect(OpCode::Call, VariableType::JS_ANY, &[value]);
                }
            }
            9 => {
                if let Some(entry) = pick(&labels, a) {
                    let _ = env.sub_cfg_entry(entry);
                }
            }
            10 => {
                let _ = env.sub_cfg_exit();
            }
            _ => {
                if let (Some(index), Some(default)) = (pick(&values, a), pick(&labels, b)) {
                    let cases: Vec<Label> = (0..(b % 3) as usize)
                        .filter_map(|offset| pick(&labels, a.wrapping_add(offset as u8)))
                        .collect();
                    let keys: Vec<i64> = (0..cases.len() as i64).collect();
                    let _ = env.switch(index, default, &keys, &cases);
                }
            }
        }
    }

    let _ = env.finish();
});
