use serde::{Deserialize, Serialize};

/// Answer of `blockreplicas?dataset=<name>`.
#[derive(Debug, Deserialize, Serialize)]
pub struct PhedexResponseDto {
    pub phedex: PhedexBlocksDto,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PhedexBlocksDto {
    #[serde(default)]
    pub block: Vec<PhedexBlockDto>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PhedexBlockDto {
    pub name: String,
    #[serde(default)]
    pub replica: Vec<PhedexReplicaDto>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PhedexReplicaDto {
    pub node: String,
}
