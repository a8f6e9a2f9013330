use crate::auth::middleware::BasicAuthenticated;
use crate::inference::pipeline::{PipelineError, PredictionPipeline};
use actix_web::{HttpResponse, web};
use log::{debug, error, warn};
use shared::{PredictionResponse, RootMessage};
use uuid::Uuid;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(read_root)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

async fn read_root() -> HttpResponse {
    HttpResponse::Ok().json(RootMessage {
        msg: "Digit Image Classification.".to_string(),
    })
}

async fn predict(
    _auth: BasicAuthenticated,
    pipeline: web::Data<PredictionPipeline>,
    body: web::Bytes,
) -> Result<HttpResponse, PipelineError> {
    let trace_id = Uuid::new_v4();

    match pipeline.handle_predict(&body) {
        Ok(result) => {
            debug!("[{}] predicted label {}", trace_id, result.label);
            Ok(HttpResponse::Ok().json(PredictionResponse::from(result)))
        }
        Err(e) => {
            if e.is_client_error() {
                warn!("[{}] rejected prediction request: {}", trace_id, e);
            } else {
                error!("[{}] prediction failed: {}", trace_id, e);
            }
            Err(e)
        }
    }
}
