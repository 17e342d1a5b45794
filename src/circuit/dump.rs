//! Graphviz rendering of a circuit.

use std::fmt::Write;

use crate::{
    circuit::{Circuit, EdgeKind, OpCode},
    utils::escape_dot,
};

impl Circuit {
    /// Generates a DOT format representation of all live gates.
    ///
    /// Edges point from a gate to the gates it reads. State edges are drawn
    /// solid, depend edges dashed and value edges dotted; empty slots (pending
    /// back edges) are omitted. Roots are highlighted in green, selectors in
    /// light blue.
    ///
    /// # Arguments
    ///
    /// * `title` - Optional title for the graph (e.g., the function name)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use circuit_ssa::Circuit;
    ///
    /// let circuit = Circuit::new();
    /// let dot = circuit.to_dot(Some("empty"));
    /// assert!(dot.starts_with("digraph Circuit {"));
    /// assert!(dot.contains("STATE_ENTRY"));
    /// ```
    #[must_use]
    pub fn to_dot(&self, title: Option<&str>) -> String {
        let mut dot = String::new();

        dot.push_str("digraph Circuit {\n");
        if let Some(name) = title {
            let _ = writeln!(dot, "    label=\"Circuit: {}\";", escape_dot(name));
        }
        dot.push_str("    labelloc=t;\n");
        dot.push_str("    node [shape=box, fontname=\"Courier\", fontsize=10];\n");
        dot.push_str("    edge [fontname=\"Courier\", fontsize=9];\n\n");

        for (gate_ref, gate) in self.iter() {
            let mut label = format!("{gate_ref}: {}", gate.opcode());
            if gate.machine_type().has_value() {
                let _ = write!(label, ".{}", gate.machine_type());
            }
            if matches!(gate.opcode(), OpCode::Constant | OpCode::Arg | OpCode::SwitchCase) {
                let _ = write!(label, " #{}", gate.payload());
            }

            let style = if gate.opcode().is_root() {
                ", style=filled, fillcolor=lightgreen"
            } else if gate.opcode().is_selector() {
                ", style=filled, fillcolor=lightblue"
            } else {
                ""
            };
            let _ = writeln!(
                dot,
                "    {gate_ref} [label=\"{}\"{style}];",
                escape_dot(&label)
            );
        }
        dot.push('\n');

        for (gate_ref, gate) in self.iter() {
            for (slot, input) in gate.ins().iter().enumerate() {
                let Some(input) = input else {
                    continue;
                };
                let style = match gate.edge_kind(slot) {
                    EdgeKind::State => "solid",
                    EdgeKind::Depend => "dashed",
                    EdgeKind::Value => "dotted",
                };
                let _ = writeln!(
                    dot,
                    "    {gate_ref} -> {input} [label=\"{slot}\", style={style}];"
                );
            }
        }

        dot.push_str("}\n");
        dot
    }
}

#[cfg(test)]
mod tests {
    use crate::circuit::{Circuit, GateShape, GateType, MachineType, OpCode};

    #[test]
    fn test_to_dot_edges() {
        let mut circuit = Circuit::new();
        let state = circuit.state_root();
        let depend = circuit.depend_root();
        let value = circuit.constant(MachineType::I32, 3, GateType::NativeValue);
        let store = circuit
            .new_gate(
                OpCode::Store,
                MachineType::NoValue,
                GateType::Empty,
                0,
                GateShape::new(1, 1, 1),
                &[state, depend, value],
            )
            .unwrap();

        let dot = circuit.to_dot(Some("store"));
        assert!(dot.contains("label=\"Circuit: store\""));
        assert!(dot.contains(&format!("{store} -> {state} [label=\"0\", style=solid]")));
        assert!(dot.contains(&format!("{store} -> {depend} [label=\"1\", style=dashed]")));
        assert!(dot.contains(&format!("{store} -> {value} [label=\"2\", style=dotted]")));
        assert!(dot.contains("CONSTANT.i32 #3"));
    }

    #[test]
    fn test_to_dot_skips_deleted_and_empty_slots() {
        let mut circuit = Circuit::new();
        let state = circuit.state_root();
        let loop_begin = circuit
            .new_gate(
                OpCode::LoopBegin,
                MachineType::NoValue,
                GateType::Empty,
                0,
                GateShape::new(2, 0, 0),
                &[state],
            )
            .unwrap();
        let dead = circuit
            .new_gate(
                OpCode::OrdinaryBlock,
                MachineType::NoValue,
                GateType::Empty,
                0,
                GateShape::new(1, 0, 0),
                &[state],
            )
            .unwrap();
        circuit.delete_gate(dead).unwrap();

        let dot = circuit.to_dot(None);
        assert!(dot.contains(&format!("{loop_begin} -> {state}")));
        assert!(!dot.contains("label=\"1\", style=solid"));
        assert!(!dot.contains(&format!("    {dead} [")));
    }
}
