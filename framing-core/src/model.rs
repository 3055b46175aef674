//! # Modelo Pré-treinado de Sentimento
//!
//! Encapsula o classificador `cardiffnlp/twitter-xlm-roberta-base-sentiment`
//! (XLM-RoBERTa base com cabeça de classificação de três classes), executado com
//! [candle](https://github.com/huggingface/candle).
//!
//! ## Carga
//!
//! 1. `config.json` e os pesos são baixados do Hugging Face Hub (com cache local).
//!    Preferimos `model.safetensors`; se o repositório só tiver `pytorch_model.bin`,
//!    os pesos são lidos do checkpoint PyTorch.
//! 2. O `tokenizer.json` vem do próprio repositório ou, se não existir, do repositório
//!    alternativo configurado (o vocabulário SentencePiece é o mesmo do XLM-R base).
//! 3. Truncamento em `max_length` tokens e padding até o maior texto do lote.
//!
//! O modelo nunca é re-treinado: os tensores de entrada não são variáveis treináveis,
//! então nenhum grafo de gradiente é mantido durante a inferência.
//!
//! Todo texto é tratado como inglês, mesmo quando o bloco é "jp" ou "ru". É uma
//! simplificação deliberada do pipeline.

use std::path::PathBuf;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config, XLMRobertaForSequenceClassification};
use hf_hub::api::sync::{Api, ApiRepo};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::error::{FramingError, Result};
use crate::sentiment::{SentimentClassifier, LABELS};

const PAD_TOKEN: &str = "<pad>";

/// Classificador XLM-RoBERTa carregado em memória.
pub struct XlmRobertaSentiment {
    name: String,
    model: XLMRobertaForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
}

impl XlmRobertaSentiment {
    /// Baixa (ou reaproveita do cache) e inicializa o modelo.
    ///
    /// Qualquer falha aqui é fatal para a análise.
    pub fn load(config: &ModelConfig) -> Result<Self> {
        let name = config.name.as_str();
        let device = if config.prefer_gpu {
            Device::cuda_if_available(0)?
        } else {
            Device::Cpu
        };

        let api = Api::new().map_err(|e| FramingError::model_load(name, e))?;
        let repo = api.model(name.to_string());

        let config_path = repo
            .get("config.json")
            .map_err(|e| FramingError::model_load(name, e))?;
        let raw_config = std::fs::read_to_string(&config_path)?;
        let model_config: Config =
            serde_json::from_str(&raw_config).map_err(|e| FramingError::model_load(name, e))?;

        let vb = load_weights(&repo, name, &device)?;
        let model = XLMRobertaForSequenceClassification::new(LABELS.len(), &model_config, vb)?;

        let tokenizer_path = match repo.get("tokenizer.json") {
            Ok(path) => path,
            Err(_) => {
                warn!(
                    model = name,
                    fallback = %config.tokenizer_repo,
                    "modelo sem tokenizer.json; usando repositório alternativo"
                );
                api.model(config.tokenizer_repo.clone())
                    .get("tokenizer.json")
                    .map_err(|e| FramingError::model_load(name, e))?
            }
        };
        let tokenizer = prepare_tokenizer(tokenizer_path, config.max_length, name)?;

        info!(model = name, device = ?device, "modelo de sentimento carregado");
        Ok(Self {
            name: name.to_string(),
            model,
            tokenizer,
            device,
        })
    }
}

fn load_weights(repo: &ApiRepo, name: &str, device: &Device) -> Result<VarBuilder<'static>> {
    if let Ok(path) = repo.get("model.safetensors") {
        // SAFETY: o arquivo vem do cache do hub e não é modificado enquanto mapeado
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)? };
        return Ok(vb);
    }
    let path = repo
        .get("pytorch_model.bin")
        .map_err(|e| FramingError::model_load(name, e))?;
    Ok(VarBuilder::from_pth(path, DType::F32, device)?)
}

fn prepare_tokenizer(path: PathBuf, max_length: usize, name: &str) -> Result<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(&path).map_err(|e| FramingError::model_load(name, e))?;
    let pad_id = tokenizer.token_to_id(PAD_TOKEN).unwrap_or(1);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| FramingError::model_load(name, e))?;
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        pad_id,
        pad_token: PAD_TOKEN.to_string(),
        ..Default::default()
    }));
    Ok(tokenizer)
}

impl SentimentClassifier for XlmRobertaSentiment {
    fn name(&self) -> &str {
        &self.name
    }

    fn logits(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        if batch.is_empty() {
            return Ok(vec![]);
        }
        let encodings = self
            .tokenizer
            .encode_batch(batch.to_vec(), true)
            .map_err(|e| FramingError::Inference(e.to_string()))?;

        // padding BatchLongest: todos os encodings têm o mesmo comprimento
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        let ids: Vec<u32> = encodings.iter().flat_map(|e| e.get_ids().iter().copied()).collect();
        let mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().iter().copied())
            .collect();

        let input_ids = Tensor::from_vec(ids, (batch.len(), seq_len), &self.device)?;
        let attention_mask = Tensor::from_vec(mask, (batch.len(), seq_len), &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let logits = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids)?
            .to_dtype(DType::F32)?
            .to_vec2::<f32>()?;
        Ok(logits)
    }
}
