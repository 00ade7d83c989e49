// ONNX Runtime emotion classifier
//
// Expects a model directory exported from a HuggingFace sequence
// classification checkpoint:
// - model.onnx      graph whose first output is the [1, 28] logits
// - tokenizer.json  tokenizer in HuggingFace `tokenizers` format
// - config.json     optional, `id2label` is checked against our label order
//
// Only the inputs the graph declares are fed.

use ort::session::Session;
use ort::value::{DynValue, Tensor};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

use super::{ClassifierError, EmotionClassifier};
use crate::emotion::{EmotionLabel, EMOTION_COUNT};

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";
const CONFIG_FILE: &str = "config.json";

/// Graph inputs we know how to fill from a tokenizer encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelInput {
    InputIds,
    AttentionMask,
    TokenTypeIds,
}

impl ModelInput {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "input_ids" => Some(ModelInput::InputIds),
            "attention_mask" => Some(ModelInput::AttentionMask),
            "token_type_ids" => Some(ModelInput::TokenTypeIds),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            ModelInput::InputIds => "input_ids",
            ModelInput::AttentionMask => "attention_mask",
            ModelInput::TokenTypeIds => "token_type_ids",
        }
    }
}

/// Tuning knobs for model loading and tokenization.
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// Inputs longer than this many tokens are truncated.
    pub max_length: usize,
    /// Threads ONNX Runtime may use inside one operator.
    pub intra_threads: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            max_length: 128,
            intra_threads: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ModelConfig {
    #[serde(default)]
    model_type: Option<String>,
    #[serde(default)]
    id2label: Option<HashMap<String, String>>,
}

pub struct OnnxEmotionClassifier {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    inputs: Vec<ModelInput>,
}

impl OnnxEmotionClassifier {
    /// Load the model and tokenizer from `model_dir`.
    ///
    /// Any failure here is fatal: the caller must not serve requests without
    /// a classifier.
    pub fn load(model_dir: &Path, settings: &ClassifierSettings) -> Result<Self, ClassifierError> {
        if !model_dir.is_dir() {
            return Err(ClassifierError::Load(format!(
                "model directory {} does not exist",
                model_dir.display()
            )));
        }

        let config_path = model_dir.join(CONFIG_FILE);
        let config = match std::fs::read_to_string(&config_path) {
            Ok(raw) => parse_model_config(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} in {}, skipping label check", CONFIG_FILE, model_dir.display());
                ModelConfig::default()
            }
            Err(e) => {
                return Err(ClassifierError::Load(format!(
                    "failed to read {}: {}",
                    config_path.display(),
                    e
                )))
            }
        };

        let tokenizer = load_tokenizer(&model_dir.join(TOKENIZER_FILE), settings.max_length)?;

        let model_path = model_dir.join(MODEL_FILE);
        if !model_path.exists() {
            return Err(ClassifierError::Load(format!(
                "{} not found in {}",
                MODEL_FILE,
                model_dir.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| ClassifierError::Load(format!("failed to create session builder: {}", e)))?
            .with_intra_threads(settings.intra_threads)
            .map_err(|e| ClassifierError::Load(format!("failed to configure session: {}", e)))?
            .commit_from_file(&model_path)
            .map_err(|e| ClassifierError::Load(format!("failed to load {}: {}", model_path.display(), e)))?;

        let input_names: Vec<&str> = session.inputs().iter().map(|input| input.name()).collect();
        let inputs = resolve_model_inputs(&input_names)?;

        info!(
            "Loaded emotion model from {} (model_type: {:?}, inputs: {:?}, max_length: {})",
            model_dir.display(),
            config.model_type,
            input_names,
            settings.max_length
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            inputs,
        })
    }

    fn scores(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let mut inputs: Vec<(&str, DynValue)> = Vec::with_capacity(self.inputs.len());
        for (input, values) in encode_inputs(&self.tokenizer, &self.inputs, text)? {
            inputs.push((input.name(), to_input(values.len(), values)?));
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassifierError::Inference("model session lock poisoned".to_string()))?;
        let outputs = session
            .run(inputs)
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let (_shape, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(format!("failed to extract logits: {}", e)))?;

        Ok(logits.to_vec())
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&self, text: &str) -> Result<EmotionLabel, ClassifierError> {
        let scores = self.scores(text)?;
        let label = label_from_scores(&scores)?;
        debug!("Classified {} chars as {}", text.len(), label);
        Ok(label)
    }
}

/// Map the graph's declared input names onto tokenizer outputs.
/// `input_ids` is mandatory; any name we can't fill fails the load.
fn resolve_model_inputs(names: &[&str]) -> Result<Vec<ModelInput>, ClassifierError> {
    let inputs = names
        .iter()
        .map(|name| {
            ModelInput::from_name(name)
                .ok_or_else(|| ClassifierError::Load(format!("unsupported model input {:?}", name)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if !inputs.contains(&ModelInput::InputIds) {
        return Err(ClassifierError::Load(
            "model does not declare an input_ids input".to_string(),
        ));
    }
    Ok(inputs)
}

/// Tokenize `text` and build one i64 row per declared input, in graph order.
fn encode_inputs(
    tokenizer: &Tokenizer,
    inputs: &[ModelInput],
    text: &str,
) -> Result<Vec<(ModelInput, Vec<i64>)>, ClassifierError> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| ClassifierError::Tokenize(e.to_string()))?;

    let as_i64 = |values: &[u32]| values.iter().map(|&v| v as i64).collect::<Vec<i64>>();
    Ok(inputs
        .iter()
        .map(|&input| {
            let values = match input {
                ModelInput::InputIds => as_i64(encoding.get_ids()),
                ModelInput::AttentionMask => as_i64(encoding.get_attention_mask()),
                ModelInput::TokenTypeIds => as_i64(encoding.get_type_ids()),
            };
            (input, values)
        })
        .collect())
}

fn to_input(seq_len: usize, values: Vec<i64>) -> Result<DynValue, ClassifierError> {
    Tensor::from_array(([1usize, seq_len], values))
        .map(|tensor| tensor.into_dyn())
        .map_err(|e| ClassifierError::Inference(format!("failed to build input tensor: {}", e)))
}

fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer, ClassifierError> {
    if !path.exists() {
        return Err(ClassifierError::Load(format!("{} not found", path.display())));
    }

    let mut tokenizer = Tokenizer::from_file(path)
        .map_err(|e| ClassifierError::Load(format!("failed to load tokenizer from {}: {}", path.display(), e)))?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| ClassifierError::Load(format!("invalid truncation settings: {}", e)))?;

    if tokenizer.get_padding().is_none() {
        tokenizer.with_padding(Some(PaddingParams::default()));
    }

    Ok(tokenizer)
}

fn parse_model_config(raw: &str) -> Result<ModelConfig, ClassifierError> {
    let config: ModelConfig = serde_json::from_str(raw)
        .map_err(|e| ClassifierError::Load(format!("failed to parse {}: {}", CONFIG_FILE, e)))?;

    if let Some(id2label) = &config.id2label {
        validate_id2label(id2label)?;
    }

    Ok(config)
}

/// The model's label ids must cover 0..28 once each.
///
/// Index order is authoritative. Generic `LABEL_{i}` names are accepted, a
/// name belonging to a different emotion means the head was trained with
/// another order and fails the load, anything else is only logged.
fn validate_id2label(id2label: &HashMap<String, String>) -> Result<(), ClassifierError> {
    if id2label.len() != EMOTION_COUNT {
        return Err(ClassifierError::Load(format!(
            "model declares {} labels, expected {}",
            id2label.len(),
            EMOTION_COUNT
        )));
    }

    let mut seen = [false; EMOTION_COUNT];
    for (id, name) in id2label {
        let index: usize = id
            .trim()
            .parse()
            .map_err(|e| ClassifierError::Load(format!("invalid label id {:?}: {}", id, e)))?;
        let expected = EmotionLabel::from_index(index)
            .ok_or_else(|| ClassifierError::Load(format!("label id {} out of range", index)))?;
        if std::mem::replace(&mut seen[index], true) {
            return Err(ClassifierError::Load(format!("label id {} declared twice", index)));
        }

        let name = name.trim();
        if expected.as_str().eq_ignore_ascii_case(name)
            || name.eq_ignore_ascii_case(&format!("LABEL_{}", index))
        {
            continue;
        }
        match EmotionLabel::parse(name) {
            Some(other) => {
                return Err(ClassifierError::Load(format!(
                    "label id {} is {:?} in the model, expected {:?}",
                    index,
                    other.as_str(),
                    expected.as_str()
                )))
            }
            None => warn!(
                "Model names label {} {:?}, treating it as {}",
                index, name, expected
            ),
        }
    }

    Ok(())
}

/// Argmax over the model scores. Ties resolve to the lowest index.
fn label_from_scores(scores: &[f32]) -> Result<EmotionLabel, ClassifierError> {
    if scores.len() != EMOTION_COUNT {
        return Err(ClassifierError::OutputShape {
            expected: EMOTION_COUNT,
            actual: scores.len(),
        });
    }

    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }

    best.and_then(|(index, _)| EmotionLabel::from_index(index))
        .ok_or_else(|| ClassifierError::Inference("model returned no finite scores".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenizers::PaddingStrategy;

    fn canonical_id2label() -> HashMap<String, String> {
        EmotionLabel::ALL
            .iter()
            .map(|label| (label.index().to_string(), label.as_str().to_string()))
            .collect()
    }

    #[test]
    fn test_argmax_picks_highest_score() {
        let mut scores = vec![0.0f32; EMOTION_COUNT];
        scores[17] = 4.2;
        scores[3] = 1.1;
        assert_eq!(label_from_scores(&scores).unwrap(), EmotionLabel::Joy);

        scores[27] = 9.0;
        assert_eq!(label_from_scores(&scores).unwrap(), EmotionLabel::Neutral);
    }

    #[test]
    fn test_argmax_tie_takes_first() {
        let scores = vec![-1.0f32; EMOTION_COUNT];
        assert_eq!(label_from_scores(&scores).unwrap(), EmotionLabel::Admiration);
    }

    #[test]
    fn test_argmax_ignores_nan() {
        let mut scores = vec![0.5f32; EMOTION_COUNT];
        scores[0] = f32::NAN;
        scores[25] = 2.0;
        assert_eq!(label_from_scores(&scores).unwrap(), EmotionLabel::Sadness);

        let all_nan = vec![f32::NAN; EMOTION_COUNT];
        assert!(matches!(label_from_scores(&all_nan), Err(ClassifierError::Inference(_))));
    }

    #[test]
    fn test_wrong_output_width_is_rejected() {
        let err = label_from_scores(&[0.1, 0.9]).unwrap_err();
        assert!(matches!(err, ClassifierError::OutputShape { expected: 28, actual: 2 }));
    }

    #[test]
    fn test_id2label_accepts_canonical_order() {
        assert!(validate_id2label(&canonical_id2label()).is_ok());

        let mut upper = canonical_id2label();
        upper.insert("17".to_string(), "JOY".to_string());
        assert!(validate_id2label(&upper).is_ok());
    }

    #[test]
    fn test_id2label_rejects_permuted_labels() {
        let mut swapped = canonical_id2label();
        swapped.insert("0".to_string(), "amusement".to_string());
        swapped.insert("1".to_string(), "admiration".to_string());
        assert!(matches!(validate_id2label(&swapped), Err(ClassifierError::Load(_))));

        let mut short = canonical_id2label();
        short.remove("27");
        assert!(validate_id2label(&short).is_err());
    }

    #[test]
    fn test_id2label_accepts_generic_names() {
        let generic: HashMap<String, String> = (0..EMOTION_COUNT)
            .map(|i| (i.to_string(), format!("LABEL_{}", i)))
            .collect();
        assert!(validate_id2label(&generic).is_ok());

        let raw = serde_json::json!({ "model_type": "bert", "id2label": generic }).to_string();
        let config = parse_model_config(&raw).unwrap();
        assert_eq!(config.id2label.map(|m| m.len()), Some(EMOTION_COUNT));

        let mut renamed = canonical_id2label();
        renamed.insert("17".to_string(), "happiness".to_string());
        assert!(validate_id2label(&renamed).is_ok());
    }

    #[test]
    fn test_id2label_rejects_bad_ids() {
        let mut out_of_range = canonical_id2label();
        out_of_range.remove("27");
        out_of_range.insert("28".to_string(), "LABEL_28".to_string());
        assert!(validate_id2label(&out_of_range).is_err());

        let mut duplicate = canonical_id2label();
        duplicate.remove("27");
        duplicate.insert("00".to_string(), "admiration".to_string());
        assert!(validate_id2label(&duplicate).is_err());
    }

    #[test]
    fn test_model_config_parsing() {
        let raw = r#"{"model_type": "bert", "num_labels": 28}"#;
        let config = parse_model_config(raw).unwrap();
        assert_eq!(config.model_type.as_deref(), Some("bert"));
        assert!(config.id2label.is_none());

        assert!(parse_model_config("not json").is_err());
    }

    #[test]
    fn test_missing_model_dir_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let result = OnnxEmotionClassifier::load(&missing, &ClassifierSettings::default());
        assert!(matches!(result, Err(ClassifierError::Load(_))));
    }

    #[test]
    fn test_missing_tokenizer_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = OnnxEmotionClassifier::load(dir.path(), &ClassifierSettings::default());
        match result {
            Err(ClassifierError::Load(msg)) => assert!(msg.contains("tokenizer.json")),
            _ => panic!("expected load error"),
        }
    }

    const VOCAB_TOKENIZER: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": PADDING,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[UNK]": 0, "[PAD]": 1, "i": 2, "feel": 3, "happy": 4 },
            "unk_token": "[UNK]"
        }
    }"#;

    fn write_tokenizer(dir: &Path, padding: &str) -> std::path::PathBuf {
        let path = dir.join(TOKENIZER_FILE);
        std::fs::write(&path, VOCAB_TOKENIZER.replace("PADDING", padding)).unwrap();
        path
    }

    #[test]
    fn test_tokenizer_truncates_to_max_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_tokenizer(dir.path(), "null");

        let tokenizer = load_tokenizer(&path, 4).unwrap();
        assert!(tokenizer.get_padding().is_some());

        let encoding = tokenizer.encode("i feel happy i feel happy", true).unwrap();
        assert_eq!(encoding.get_ids(), &[2, 3, 4, 2]);
    }

    #[test]
    fn test_tokenizer_keeps_existing_padding() {
        let dir = tempfile::tempdir().unwrap();
        let padding = r#"{
            "strategy": { "Fixed": 8 },
            "direction": "Right",
            "pad_to_multiple_of": null,
            "pad_id": 1,
            "pad_type_id": 0,
            "pad_token": "[PAD]"
        }"#;
        let path = write_tokenizer(dir.path(), padding);

        let tokenizer = load_tokenizer(&path, 128).unwrap();
        assert!(matches!(
            tokenizer.get_padding().map(|p| &p.strategy),
            Some(PaddingStrategy::Fixed(8))
        ));

        let encoding = tokenizer.encode("i feel", true).unwrap();
        assert_eq!(encoding.get_ids(), &[2, 3, 1, 1, 1, 1, 1, 1]);
        assert_eq!(encoding.get_attention_mask(), &[1, 1, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_inputs_follows_graph_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = load_tokenizer(&write_tokenizer(dir.path(), "null"), 128).unwrap();

        let bert = [ModelInput::InputIds, ModelInput::AttentionMask, ModelInput::TokenTypeIds];
        let rows = encode_inputs(&tokenizer, &bert, "i feel sad").unwrap();
        assert_eq!(
            rows,
            vec![
                (ModelInput::InputIds, vec![2, 3, 0]),
                (ModelInput::AttentionMask, vec![1, 1, 1]),
                (ModelInput::TokenTypeIds, vec![0, 0, 0]),
            ]
        );

        let roberta = [ModelInput::AttentionMask, ModelInput::InputIds];
        let rows = encode_inputs(&tokenizer, &roberta, "happy").unwrap();
        assert_eq!(
            rows,
            vec![(ModelInput::AttentionMask, vec![1]), (ModelInput::InputIds, vec![4])]
        );
    }

    #[test]
    fn test_model_inputs_from_graph_names() {
        assert_eq!(
            resolve_model_inputs(&["input_ids", "attention_mask", "token_type_ids"]).unwrap(),
            vec![ModelInput::InputIds, ModelInput::AttentionMask, ModelInput::TokenTypeIds]
        );
        assert_eq!(
            resolve_model_inputs(&["input_ids", "attention_mask"]).unwrap(),
            vec![ModelInput::InputIds, ModelInput::AttentionMask]
        );

        assert!(matches!(
            resolve_model_inputs(&["input_ids", "position_ids"]),
            Err(ClassifierError::Load(_))
        ));
        assert!(resolve_model_inputs(&["attention_mask"]).is_err());
    }

    #[test]
    fn test_unreadable_config_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), [0xff, 0xfe, 0x00]).unwrap();
        write_tokenizer(dir.path(), "null");

        match OnnxEmotionClassifier::load(dir.path(), &ClassifierSettings::default()) {
            Err(ClassifierError::Load(msg)) => assert!(msg.contains(CONFIG_FILE)),
            _ => panic!("expected load error"),
        }
    }
}
