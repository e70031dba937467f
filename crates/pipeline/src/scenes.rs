//! Scene extraction.

use mangareel_stage_core::{ScenePrompt, Script};

/// Scene prompts returned for every script.
pub const PLACEHOLDER_SCENES: [&str; 3] = ["Scene 1", "Scene 2", "Scene 3"];

/// Pick the scenes to illustrate from a script.
///
/// Placeholder: the script is ignored and the same three prompts are
/// returned every time.
pub fn extract_key_scenes(_script: &Script) -> Vec<ScenePrompt> {
    PLACEHOLDER_SCENES
        .iter()
        .map(|scene| ScenePrompt::new(*scene))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_placeholder_scenes() {
        let scenes = extract_key_scenes(&Script::new("A dragon guards the bridge."));
        let names: Vec<&str> = scenes.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(names, vec!["Scene 1", "Scene 2", "Scene 3"]);
    }

    #[test]
    fn test_empty_script() {
        assert_eq!(extract_key_scenes(&Script::new("")).len(), 3);
    }

    proptest! {
        #[test]
        fn scenes_do_not_depend_on_script(text in ".*") {
            let scenes = extract_key_scenes(&Script::new(text));
            prop_assert_eq!(scenes, extract_key_scenes(&Script::new("reference")));
        }
    }
}
