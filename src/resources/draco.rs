//! Decode helpers for `KHR_draco_mesh_compression` primitives.
//!
//! The compressed payload lives in a buffer view named by the extension
//! object; attribute order inside the decoded stream follows the extension's
//! attribute ids, so the decode config has to be built in exactly that order
//! before the stream can be walked back apart.

use anyhow::{Context, Result, anyhow};
use draco_decoder::{AttributeDataType, MeshDecodeConfig, decode_mesh};
use gltf::mesh::Semantic;

/// CPU-side output of one decoded primitive.
pub(crate) struct DecodedPrimitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

fn accessor_shape(accessor: &gltf::Accessor) -> (u32, AttributeDataType) {
    let dim = match accessor.dimensions() {
        gltf::accessor::Dimensions::Scalar => 1,
        gltf::accessor::Dimensions::Vec2 => 2,
        gltf::accessor::Dimensions::Vec3 => 3,
        gltf::accessor::Dimensions::Vec4 => 4,
        _ => 3,
    };
    let ty = match accessor.data_type() {
        gltf::accessor::DataType::F32 => AttributeDataType::Float32,
        gltf::accessor::DataType::U32 => AttributeDataType::UInt32,
        gltf::accessor::DataType::U16 => AttributeDataType::UInt16,
        gltf::accessor::DataType::I16 => AttributeDataType::Int16,
        gltf::accessor::DataType::U8 => AttributeDataType::UInt8,
        gltf::accessor::DataType::I8 => AttributeDataType::Int8,
    };
    (dim, ty)
}

fn read_vec3s(slice: &[u8], dim: usize, fill_z: f32) -> Vec<[f32; 3]> {
    let mut out = Vec::with_capacity(slice.len() / (4 * dim));
    for c in slice.chunks_exact(4 * dim) {
        let x = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
        let y = f32::from_le_bytes([c[4], c[5], c[6], c[7]]);
        let z = if dim > 2 {
            f32::from_le_bytes([c[8], c[9], c[10], c[11]])
        } else {
            fill_z
        };
        out.push([x, y, z]);
    }
    out
}

/// Decode one Draco-compressed primitive into positions, normals, texture
/// coordinates and indices.
pub(crate) async fn decode_primitive(
    doc: &gltf::Document,
    buffers: &[Vec<u8>],
    prim: &gltf::mesh::Primitive<'_>,
) -> Result<DecodedPrimitive> {
    let ext_val = prim
        .extension_value("KHR_draco_mesh_compression")
        .context("primitive carries no draco extension")?;
    let obj = ext_val.as_object().context("draco ext not an object")?;
    let bv_index = obj
        .get("bufferView")
        .and_then(|v| v.as_u64())
        .context("draco bufferView missing")? as usize;
    let attr_map = obj
        .get("attributes")
        .and_then(|v| v.as_object())
        .context("draco attributes missing")?;

    // Resolve compressed bytes from the buffer view
    let bv = doc
        .views()
        .nth(bv_index)
        .context("bufferView index out of range")?;
    let data = buffers
        .get(bv.buffer().index())
        .context("draco buffer index out of range")?;
    let start = bv.offset();
    let end = start + bv.length();
    let comp_bytes = &data[start..end];

    // Counts
    let pos_accessor = prim
        .get(&Semantic::Positions)
        .context("POSITION accessor missing")?;
    let vertex_count = pos_accessor.count() as u32;
    let index_count = prim.indices().map(|a| a.count() as u32).unwrap_or(0);

    // Map semantics by attribute id, sorted: the decoded stream is laid out
    // in this order.
    let mut mapped: Vec<(u32, Semantic)> = Vec::new();
    for (k, v) in attr_map.iter() {
        let id = v.as_u64().unwrap_or(0) as u32;
        let sem = match k.as_str() {
            "POSITION" => Semantic::Positions,
            "NORMAL" => Semantic::Normals,
            s if s.starts_with("TEXCOORD_") => {
                let set: u32 = s[9..].parse().unwrap_or(0);
                Semantic::TexCoords(set)
            }
            _ => continue,
        };
        mapped.push((id, sem));
    }
    mapped.sort_by_key(|(id, _)| *id);

    let mut cfg = MeshDecodeConfig::new(vertex_count, index_count);
    for (_, sem) in &mapped {
        let acc = prim
            .get(sem)
            .context("accessor for mapped semantic missing")?;
        let (dim, ty) = accessor_shape(&acc);
        cfg.add_attribute(dim, ty);
    }

    let decoded = decode_mesh(comp_bytes, &cfg)
        .await
        .context("draco decode failed")?;

    // Indices come first: 16-bit when they fit, 32-bit otherwise.
    let mut indices: Vec<u32> = Vec::with_capacity(index_count as usize);
    let mut off = 0usize;
    let idx_bytes = if index_count <= u16::MAX as u32 {
        (index_count as usize) * 2
    } else {
        (index_count as usize) * 4
    };
    if idx_bytes > 0 {
        let idx_slice = decoded
            .get(off..off + idx_bytes)
            .context("decoded stream too short for indices")?;
        off += idx_bytes;
        if index_count <= u16::MAX as u32 {
            for c in idx_slice.chunks_exact(2) {
                indices.push(u16::from_le_bytes([c[0], c[1]]) as u32);
            }
        } else {
            for c in idx_slice.chunks_exact(4) {
                indices.push(u32::from_le_bytes([c[0], c[1], c[2], c[3]]));
            }
        }
    }

    // Attributes follow, in mapped order.
    let mut pos_opt: Option<Vec<[f32; 3]>> = None;
    let mut nrm_opt: Option<Vec<[f32; 3]>> = None;
    let mut uv_opt: Option<Vec<[f32; 2]>> = None;
    for (_, sem) in &mapped {
        let acc = prim.get(sem).unwrap();
        let (dim, ty) = accessor_shape(&acc);
        let dim = dim as usize;
        let bytes_len = dim * (vertex_count as usize) * ty.size_in_bytes();
        let slice = decoded
            .get(off..off + bytes_len)
            .context("decoded stream too short for attributes")?;
        off += bytes_len;

        match (sem, ty) {
            (Semantic::Positions, AttributeDataType::Float32) => {
                pos_opt = Some(read_vec3s(slice, dim, 0.0));
            }
            (Semantic::Normals, AttributeDataType::Float32) => {
                nrm_opt = Some(read_vec3s(slice, dim, 1.0));
            }
            (Semantic::TexCoords(0), AttributeDataType::Float32) => {
                let mut v = Vec::with_capacity(vertex_count as usize);
                for c in slice.chunks_exact(4 * dim) {
                    let u = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                    let w = f32::from_le_bytes([c[4], c[5], c[6], c[7]]);
                    v.push([u, w]);
                }
                uv_opt = Some(v);
            }
            _ => {}
        }
    }

    let positions = pos_opt.context("decoded POSITION missing")?;
    if positions.len() != vertex_count as usize {
        return Err(anyhow!(
            "decoded {} positions, accessor declares {}",
            positions.len(),
            vertex_count
        ));
    }
    let normals = nrm_opt.unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
    let tex_coords = uv_opt.unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);
    if indices.is_empty() {
        indices = (0..positions.len() as u32).collect();
    }

    Ok(DecodedPrimitive {
        positions,
        normals,
        tex_coords,
        indices,
    })
}
