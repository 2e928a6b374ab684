use regex::Regex;

use crate::AssetError;

/// Shell-style pattern over `/`-separated logical asset paths.
///
/// Each component is matched on its own, so `*` never crosses a directory
/// boundary. Hidden entries (leading `.`) only match components that start
/// with a literal dot.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    components: Vec<ComponentMatcher>,
}

#[derive(Debug, Clone)]
enum ComponentMatcher {
    Literal(String),
    Wild { regex: Regex, allow_hidden: bool },
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, AssetError> {
        let normalized = normalize_logical(pattern);
        let mut components = Vec::new();
        for part in normalized.split('/') {
            if part.is_empty() {
                continue;
            }
            if has_magic(part) {
                let source = translate_component(part);
                let regex = Regex::new(&source).map_err(|source| AssetError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
                components.push(ComponentMatcher::Wild {
                    regex,
                    allow_hidden: part.starts_with('.'),
                });
            } else {
                components.push(ComponentMatcher::Literal(part.to_string()));
            }
        }
        if components.is_empty() {
            return Err(AssetError::EmptyPattern);
        }
        Ok(GlobPattern {
            raw: normalized,
            components,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// Tests a single path component against the pattern component at `index`.
    pub fn matches_component(&self, index: usize, name: &str) -> bool {
        match self.components.get(index) {
            Some(ComponentMatcher::Literal(literal)) => literal == name,
            Some(ComponentMatcher::Wild {
                regex,
                allow_hidden,
            }) => {
                if name.starts_with('.') && !allow_hidden {
                    return false;
                }
                regex.is_match(name)
            }
            None => false,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let normalized = normalize_logical(path);
        let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
        parts.len() == self.components.len()
            && parts
                .iter()
                .enumerate()
                .all(|(index, part)| self.matches_component(index, part))
    }
}

pub fn has_magic(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

/// Normalises separators so Windows-style paths and leading `./` resolve the
/// same way as the logical `phase_x/...` form.
pub fn normalize_logical(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let mut trimmed = replaced.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_string()
}

fn translate_component(component: &str) -> String {
    let mut out = String::from("^");
    let chars: Vec<char> = component.chars().collect();
    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class_end(&chars, index) {
                Some(end) => {
                    let mut body: String = chars[index + 1..end].iter().collect();
                    let negated = body.starts_with('!');
                    if negated {
                        body.remove(0);
                    }
                    out.push('[');
                    if negated {
                        out.push('^');
                    }
                    for c in body.chars() {
                        if c == '\\' || c == '^' || c == '[' || c == ']' {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push(']');
                    index = end;
                }
                None => out.push_str(r"\["),
            },
            other => out.push_str(&regex::escape(&other.to_string())),
        }
        index += 1;
    }
    out.push('$');
    out
}

fn class_end(chars: &[char], open: usize) -> Option<usize> {
    let mut index = open + 1;
    if chars.get(index) == Some(&'!') {
        index += 1;
    }
    // a leading ']' is literal
    if chars.get(index) == Some(&']') {
        index += 1;
    }
    while index < chars.len() {
        if chars[index] == ']' {
            return Some(index);
        }
        index += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_stays_within_component() {
        let pattern = GlobPattern::new("phase_*/models/char/tt_a_ene_cga_*.bam").unwrap();
        assert!(pattern.matches("phase_3.5/models/char/tt_a_ene_cga_walk.bam"));
        assert!(pattern.matches("phase_5/models/char/tt_a_ene_cga_zero.bam"));
        assert!(!pattern.matches("phase_5/models/char/extra/tt_a_ene_cga_zero.bam"));
        assert!(!pattern.matches("phase_5/models/char/tt_a_ene_cgb_zero.bam"));
    }

    #[test]
    fn classes_and_question_marks() {
        let pattern = GlobPattern::new("phase_[34]/maps/?_arm.jpg").unwrap();
        assert!(pattern.matches("phase_3/maps/s_arm.jpg"));
        assert!(pattern.matches("phase_4/maps/m_arm.jpg"));
        assert!(!pattern.matches("phase_5/maps/m_arm.jpg"));
        assert!(!pattern.matches("phase_3/maps/ss_arm.jpg"));

        let negated = GlobPattern::new("phase_[!3]").unwrap();
        assert!(negated.matches("phase_4"));
        assert!(!negated.matches("phase_3"));
    }

    #[test]
    fn hidden_entries_need_a_literal_dot() {
        let pattern = GlobPattern::new("phase_3/*").unwrap();
        assert!(!pattern.matches("phase_3/.DS_Store"));
        let dotted = GlobPattern::new("phase_3/.*").unwrap();
        assert!(dotted.matches("phase_3/.DS_Store"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let pattern = GlobPattern::new("phase_3.5/models/*.bam").unwrap();
        assert!(pattern.matches("phase_3.5/models/a.bam"));
        assert!(!pattern.matches("phase_305/models/a.bam"));
        assert!(!pattern.matches("phase_3.5/models/a_bam"));
    }

    #[test]
    fn normalizes_separators() {
        assert_eq!(
            normalize_logical(r".\phase_4\models\char\x.bam"),
            "phase_4/models/char/x.bam"
        );
        assert_eq!(normalize_logical("/phase_4/x"), "phase_4/x");
        assert!(matches!(GlobPattern::new("//"), Err(AssetError::EmptyPattern)));
    }
}
