const PID_VARIABLE: &str = "$$";

/// Replaces every `$$` in the arguments (never the program name) with `pid`.
pub fn expand_variables<S: AsRef<str>>(words: &[S], pid: u32) -> Vec<String> {
    let pid = pid.to_string();
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            if i == 0 {
                w.as_ref().to_string()
            } else {
                expand_variables_word(w.as_ref(), &pid)
            }
        })
        .collect()
}

fn expand_variables_word(s: &str, pid: &str) -> String {
    s.replace(PID_VARIABLE, pid)
}
